//! Request path decoding and partitioning.
//!
//! A request path is split into the part that lives on disk, the first
//! segment that names a zip archive, and whatever follows inside that
//! archive. Archive detection is by file extension only: any segment whose
//! extension maps to `application/zip` is a boundary, and only the first one
//! counts.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

use crate::error::ServeError;

/// A decoded request path, split at the first archive boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPartition {
    pub fs_segments: Vec<String>,
    pub archive_segment: Option<String>,
    pub inner_segments: Vec<String>,
}

impl PathPartition {
    /// On-disk location of the filesystem part (or of the archive itself).
    pub fn fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.fs_segments);
        if let Some(archive) = &self.archive_segment {
            path.push(archive);
        }
        path
    }

    /// The `/`-joined path inside the archive, empty for the archive root.
    pub fn inner_path(&self) -> String {
        self.inner_segments.join("/")
    }
}

/// Decode a raw request path exactly once and partition it.
pub fn segment(raw_path: &str) -> Result<PathPartition, ServeError> {
    let decoded = decode(raw_path)?;

    let mut partition = PathPartition::default();
    for seg in clean(&decoded) {
        if partition.archive_segment.is_some() {
            partition.inner_segments.push(seg);
        } else if is_zip(&seg) {
            partition.archive_segment = Some(seg);
        } else {
            partition.fs_segments.push(seg);
        }
    }

    Ok(partition)
}

/// Whether a name's extension maps to the zip content type.
pub fn is_zip(name: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    mime_guess::from_ext(ext)
        .first()
        .is_some_and(|mime| mime.essence_str() == "application/zip")
}

fn decode(raw: &str) -> Result<String, ServeError> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            let end = (i + 3).min(raw.len());
            return Err(ServeError::Decode(format!(
                "invalid URL escape {:?}",
                String::from_utf8_lossy(&bytes[i..end])
            )));
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ServeError::Decode(e.to_string()))
}

/// Rooted lexical cleaning: drop empty and `.` segments, let `..` remove its
/// predecessor but never climb above the root.
fn clean(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(seg.to_string()),
        }
    }
    segments
}
