use std::path::Path;

use crate::error::ServeError;
use crate::listing::{ListingEntry, absolute_href};

use super::{ServeTarget, ensure_contained, join_segments, lstat};

const INDEX_FILE: &str = "index.html";

/// Classify the entry at `root/fs_segments` and open what will be served.
pub async fn resolve_fs(root: &Path, fs_segments: &[String]) -> Result<ServeTarget, ServeError> {
    let path = join_segments(root, fs_segments);
    let file_type = lstat(&path).await?.file_type();

    if file_type.is_symlink() {
        return Ok(ServeTarget::FilesystemSymlink { path });
    }

    if file_type.is_dir() {
        ensure_contained(root, &path).await?;

        let index = path.join(INDEX_FILE);
        // A symlinked index.html does not count; the directory gets a listing.
        if matches!(tokio::fs::symlink_metadata(&index).await, Ok(meta) if meta.is_file()) {
            return open_file(index).await;
        }

        let dir = tokio::fs::read_dir(&path).await.map_err(ServeError::Open)?;
        return Ok(ServeTarget::FilesystemDirectory { path, dir });
    }

    if file_type.is_file() {
        ensure_contained(root, &path).await?;
        return open_file(path).await;
    }

    Ok(ServeTarget::FilesystemOther { path })
}

async fn open_file(path: std::path::PathBuf) -> Result<ServeTarget, ServeError> {
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(ServeError::Open)?;
    let len = file.metadata().await.map_err(ServeError::Stat)?.len();
    Ok(ServeTarget::FilesystemFile { path, file, len })
}

/// Read every entry of an opened directory, without following symlinks.
///
/// Links are absolute, built from `link_base` (the directory's own URL
/// segments), so they work whether or not the request ended in `/`.
pub async fn list_fs_dir(
    mut dir: tokio::fs::ReadDir,
    link_base: &[String],
) -> Result<Vec<ListingEntry>, ServeError> {
    let mut entries = Vec::new();

    while let Some(entry) = dir.next_entry().await.map_err(ServeError::Listing)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().await.map_err(ServeError::Listing)?;

        let href = || {
            absolute_href(
                link_base
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(name.as_str())),
            )
        };

        let listed = if file_type.is_dir() {
            let href = format!("{}/", href());
            ListingEntry::directory(name, href)
        } else if file_type.is_file() {
            let size = entry.metadata().await.map_err(ServeError::Listing)?.len();
            let href = href();
            ListingEntry::file(name, size, href)
        } else {
            ListingEntry::other(name)
        };
        entries.push(listed);
    }

    Ok(entries)
}
