use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use flate2::CrcReader;
use flate2::read::DeflateDecoder;
use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// An opened archive: the reader plus its whole central directory.
///
/// The entry list doubles as a read-only namespace. Paths are the entry
/// names split on `/`; directories exist either as explicit `name/` records
/// or implicitly as the prefix of some other entry.
pub struct ZipArchive<R: ReadAt = LocalFileReader> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
}

/// What an internal path names.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveNode<'a> {
    Directory,
    File(&'a ZipFileEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildKind {
    Directory,
    File { size: u64 },
    Symlink,
}

/// A direct child of an archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveChild {
    pub name: String,
    pub kind: ChildKind,
}

impl ZipArchive<LocalFileReader> {
    /// Open a zip file on disk and read its central directory.
    pub async fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(Arc::new(reader)).await
    }

    /// Start decompressing one entry on the blocking pool.
    ///
    /// Header problems are reported here. Once chunks flow, a short entry or
    /// a checksum mismatch arrives as the final `Err` chunk, after the data
    /// read so far. Dropping the stream stops the decoder.
    pub async fn stream_entry(&self, entry: &ZipFileEntry) -> Result<EntryStream> {
        if !matches!(
            entry.compression_method,
            CompressionMethod::Stored | CompressionMethod::Deflate
        ) {
            bail!(
                "Unsupported compression method {} for {}",
                entry.compression_method.as_u16(),
                entry.file_name
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let section = self.parser.reader().section(data_offset, entry.compressed_size);
        let source: Box<dyn Read + Send> = match entry.compression_method {
            CompressionMethod::Deflate => Box::new(DeflateDecoder::new(section)),
            _ => Box::new(section),
        };

        let (tx, rx) = mpsc::channel(STREAM_DEPTH);
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || pump(source, &entry, &tx));
        Ok(EntryStream { rx })
    }
}

const CHUNK_SIZE: usize = 1 << 16;
const STREAM_DEPTH: usize = 4;

/// Decompressed chunks of one entry, in order.
pub struct EntryStream {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
}

impl EntryStream {
    pub async fn next_chunk(&mut self) -> Option<io::Result<Vec<u8>>> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = io::Result<Vec<u8>>> + Send + 'static {
        stream::unfold(self, |mut entry| async move {
            entry.next_chunk().await.map(|chunk| (chunk, entry))
        })
    }

    /// Drain the whole entry. Only sensible for small entries.
    pub async fn collect(mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

/// Runs on the blocking pool. A closed receiver means the client went away.
fn pump(
    source: Box<dyn Read + Send>,
    entry: &ZipFileEntry,
    tx: &mpsc::Sender<io::Result<Vec<u8>>>,
) {
    // One byte of slack so an understated size is caught below.
    let mut reader = CrcReader::new(source.take(entry.uncompressed_size.saturating_add(1)));
    let mut total = 0u64;

    loop {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                total += n as u64;
                chunk.truncate(n);
                if tx.blocking_send(Ok(chunk)).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                let _ = tx.blocking_send(Err(err));
                return;
            }
        }
    }

    let failure = if total != entry.uncompressed_size {
        format!(
            "Size mismatch for {}: expected {} bytes, got {}",
            entry.file_name, entry.uncompressed_size, total
        )
    } else if reader.crc().sum() != entry.crc32 {
        format!("CRC-32 mismatch for {}", entry.file_name)
    } else {
        return;
    };
    let _ = tx.blocking_send(Err(io::Error::new(io::ErrorKind::InvalidData, failure)));
}

impl<R: ReadAt> ZipArchive<R> {
    pub async fn from_reader(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_files().await?;
        Ok(Self { parser, entries })
    }

    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Resolve an internal `/`-separated path. The empty path is the root.
    pub fn lookup(&self, path: &str) -> Option<ArchiveNode<'_>> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(ArchiveNode::Directory);
        }

        if let Some(entry) = self.entries.iter().find(|e| e.trimmed_name() == path) {
            return Some(if entry.is_directory {
                ArchiveNode::Directory
            } else {
                ArchiveNode::File(entry)
            });
        }

        let prefix = format!("{path}/");
        self.entries
            .iter()
            .any(|e| e.file_name.starts_with(&prefix))
            .then_some(ArchiveNode::Directory)
    }

    /// Direct children of an internal directory, one level deep, in
    /// central directory order.
    pub fn children(&self, dir: &str) -> Vec<ArchiveChild> {
        let dir = dir.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut children: Vec<ArchiveChild> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for entry in &self.entries {
            let Some(rest) = entry.file_name.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((first, _)) => (first, ChildKind::Directory),
                None if entry.is_symlink() => (rest, ChildKind::Symlink),
                None => (
                    rest,
                    ChildKind::File {
                        size: entry.uncompressed_size,
                    },
                ),
            };
            if name.is_empty() {
                continue;
            }

            match seen.get(name) {
                // A name that is both a file and a prefix is shown as a directory.
                Some(&idx) => {
                    if kind == ChildKind::Directory {
                        children[idx].kind = ChildKind::Directory;
                    }
                }
                None => {
                    seen.insert(name.to_string(), children.len());
                    children.push(ArchiveChild {
                        name: name.to_string(),
                        kind,
                    });
                }
            }
        }

        children
    }
}
