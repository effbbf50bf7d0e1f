//! ZIP archive reading.
//!
//! - [`structures`]: on-disk records (EOCD, ZIP64 EOCD, central directory entries)
//! - [`parser`]: locating and decoding those records through [`ReadAt`](crate::io::ReadAt)
//! - [`archive`]: an opened archive as a browsable namespace, plus entry decompression
//!
//! Supported: standard ZIP and ZIP64, STORED and DEFLATE entries.
//! Not supported: encryption, multi-disk archives, other compression methods.

mod archive;
mod parser;
mod structures;

pub use archive::{ArchiveChild, ArchiveNode, ChildKind, EntryStream, ZipArchive};
pub use parser::ZipParser;
pub use structures::*;
