use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Positional reader over a file on the local disk.
///
/// Reads run on the blocking pool so a slow disk never stalls the runtime
/// worker serving other requests. The handle is closed when the last clone
/// of the reader is dropped.
pub struct LocalFileReader {
    file: Arc<std::fs::File>,
    size: u64,
}

impl LocalFileReader {
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?.into_std().await;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Arc::new(file),
            size,
        })
    }

    /// Blocking reader over `len` bytes starting at `offset`, sharing this
    /// reader's handle. Meant for the blocking pool.
    pub fn section(&self, offset: u64, len: u64) -> FileSection {
        FileSection {
            file: Arc::clone(&self.file),
            pos: offset,
            end: offset.saturating_add(len).min(self.size),
        }
    }
}

pub struct FileSection {
    file: Arc<std::fs::File>,
    pos: u64,
    end: u64,
}

impl std::io::Read for FileSection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.end.saturating_sub(self.pos);
        let len = (buf.len() as u64).min(remaining) as usize;
        if len == 0 {
            return Ok(0);
        }
        let n = pread(&self.file, &mut buf[..len], self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let file = Arc::clone(&self.file);
        let len = buf.len();
        let chunk = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
            let mut chunk = vec![0u8; len];
            let n = pread(&file, &mut chunk, offset)?;
            chunk.truncate(n);
            Ok(chunk)
        })
        .await??;

        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(unix)]
fn pread(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_at_offsets_and_stops_at_eof() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();

        let reader = LocalFileReader::open(tmp.path()).await.unwrap();
        assert_eq!(reader.size(), 10);

        let mut buf = [0u8; 4];
        reader.read_exact_at(3, &mut buf).await.unwrap();
        assert_eq!(&buf, b"3456");

        let mut tail = [0u8; 8];
        let n = reader.read_at(6, &mut tail).await.unwrap();
        assert_eq!(&tail[..n], b"6789");

        assert!(reader.read_exact_at(8, &mut buf).await.is_err());
        assert_eq!(reader.read_at(10, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn section_is_clamped_to_the_file() {
        use std::io::Read;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();
        let reader = LocalFileReader::open(tmp.path()).await.unwrap();

        let mut out = String::new();
        reader.section(2, 3).read_to_string(&mut out).unwrap();
        assert_eq!(out, "234");

        out.clear();
        reader.section(7, u64::MAX).read_to_string(&mut out).unwrap();
        assert_eq!(out, "789");
    }
}
