//! Turning a partitioned request path into something to serve.
//!
//! [`resolve_fs`] handles paths that stay on disk, [`resolve_archive`] paths
//! that cross into a zip archive. Both produce a [`ServeTarget`], and every
//! handle a target carries is owned by it, so dropping the target on any
//! exit path releases it.

mod archive;
mod fs;

pub use archive::{list_archive_dir, resolve_archive};
pub use fs::{list_fs_dir, resolve_fs};

use std::path::{Path, PathBuf};

use crate::error::ServeError;
use crate::zip::{ZipArchive, ZipFileEntry};

/// The closed set of outcomes of resolving one request path.
pub enum ServeTarget {
    /// A directory without an `index.html`; needs a generated listing.
    FilesystemDirectory {
        path: PathBuf,
        dir: tokio::fs::ReadDir,
    },
    /// A regular file, or the `index.html` standing in for its directory.
    FilesystemFile {
        path: PathBuf,
        file: tokio::fs::File,
        len: u64,
    },
    /// Refused whatever it points to.
    FilesystemSymlink { path: PathBuf },
    /// Device, socket, pipe: refused.
    FilesystemOther { path: PathBuf },
    ArchiveRoot {
        archive: ZipArchive,
        /// Unescaped segments of the archive's own URL.
        link_base: Vec<String>,
    },
    ArchiveInternalDirectory {
        archive: ZipArchive,
        dir: String,
        link_base: Vec<String>,
    },
    ArchiveInternalFile {
        archive: ZipArchive,
        entry: ZipFileEntry,
    },
    /// The raw archive bytes, as a download.
    ArchiveDownload {
        file: tokio::fs::File,
        len: u64,
        file_name: String,
    },
}

impl std::fmt::Debug for ServeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeTarget::FilesystemDirectory { path, .. } => {
                f.debug_tuple("FilesystemDirectory").field(path).finish()
            }
            ServeTarget::FilesystemFile { path, len, .. } => f
                .debug_struct("FilesystemFile")
                .field("path", path)
                .field("len", len)
                .finish(),
            ServeTarget::FilesystemSymlink { path } => {
                f.debug_tuple("FilesystemSymlink").field(path).finish()
            }
            ServeTarget::FilesystemOther { path } => {
                f.debug_tuple("FilesystemOther").field(path).finish()
            }
            ServeTarget::ArchiveRoot { link_base, .. } => {
                f.debug_tuple("ArchiveRoot").field(link_base).finish()
            }
            ServeTarget::ArchiveInternalDirectory { dir, .. } => {
                f.debug_tuple("ArchiveInternalDirectory").field(dir).finish()
            }
            ServeTarget::ArchiveInternalFile { entry, .. } => f
                .debug_tuple("ArchiveInternalFile")
                .field(&entry.file_name)
                .finish(),
            ServeTarget::ArchiveDownload { file_name, len, .. } => f
                .debug_struct("ArchiveDownload")
                .field("file_name", file_name)
                .field("len", len)
                .finish(),
        }
    }
}

fn join_segments(root: &Path, segments: &[String]) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(segments);
    path
}

/// Stat without following a final symlink.
async fn lstat(path: &Path) -> Result<std::fs::Metadata, ServeError> {
    tokio::fs::symlink_metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ServeError::NotFound
        } else {
            ServeError::Stat(e)
        }
    })
}

/// Refuse paths that leave the root through a symlinked parent directory.
/// `root` must already be canonical.
async fn ensure_contained(root: &Path, path: &Path) -> Result<(), ServeError> {
    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(ServeError::Stat)?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        tracing::debug!(path = %path.display(), resolved = %resolved.display(), "path escapes root");
        Err(ServeError::Forbidden("file is outside the served directory"))
    }
}
