use std::path::Path;

use crate::error::ServeError;
use crate::listing::{ListingEntry, absolute_href};
use crate::zip::{ArchiveNode, ChildKind, ZipArchive};

use super::{ServeTarget, ensure_contained, join_segments, lstat};

/// Open the archive at `root/fs_segments/archive_segment` and decide what
/// part of it the request wants.
///
/// Priority: a download request wins over any inner path; then the inner
/// path is looked up in the archive; with neither, the archive root is listed.
pub async fn resolve_archive(
    root: &Path,
    fs_segments: &[String],
    archive_segment: &str,
    inner_segments: &[String],
    wants_download: bool,
) -> Result<ServeTarget, ServeError> {
    let path = join_segments(root, fs_segments).join(archive_segment);

    let meta = lstat(&path).await?;
    if meta.file_type().is_symlink() {
        return Err(ServeError::Forbidden("file is a symlink"));
    }
    ensure_contained(root, &path).await?;

    let archive = ZipArchive::open(&path)
        .await
        .map_err(ServeError::ArchiveOpen)?;

    if wants_download {
        drop(archive);
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(ServeError::Open)?;
        let len = file.metadata().await.map_err(ServeError::Stat)?.len();
        return Ok(ServeTarget::ArchiveDownload {
            file,
            len,
            file_name: archive_segment.to_string(),
        });
    }

    let mut link_base = fs_segments.to_vec();
    link_base.push(archive_segment.to_string());

    if inner_segments.is_empty() {
        return Ok(ServeTarget::ArchiveRoot { archive, link_base });
    }

    let inner = inner_segments.join("/");
    let entry = match archive.lookup(&inner) {
        None => return Err(ServeError::NotFound),
        Some(ArchiveNode::File(entry)) if entry.is_symlink() => {
            return Err(ServeError::Forbidden("file is a symlink"));
        }
        Some(ArchiveNode::File(entry)) => Some(entry.clone()),
        Some(ArchiveNode::Directory) => None,
    };

    Ok(match entry {
        Some(entry) => ServeTarget::ArchiveInternalFile { archive, entry },
        None => {
            link_base.extend_from_slice(inner_segments);
            ServeTarget::ArchiveInternalDirectory {
                archive,
                dir: inner,
                link_base,
            }
        }
    })
}

/// Listing rows for one directory inside an archive (the root when `dir`
/// is empty). Links are absolute: `link_base` is the directory's own URL.
pub fn list_archive_dir(archive: &ZipArchive, dir: &str, link_base: &[String]) -> Vec<ListingEntry> {
    archive
        .children(dir)
        .into_iter()
        .map(|child| {
            let href = absolute_href(
                link_base
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(child.name.as_str())),
            );
            match child.kind {
                ChildKind::Directory => ListingEntry::directory(child.name, format!("{href}/")),
                ChildKind::File { size } => ListingEntry::file(child.name, size, href),
                ChildKind::Symlink => ListingEntry::other(child.name),
            }
        })
        .collect()
}
