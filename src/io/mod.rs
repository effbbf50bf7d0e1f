mod local;

pub use local::{FileSection, LocalFileReader};

use anyhow::Result;
use async_trait::async_trait;

/// Random access reads from an archive source.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read up to `buf.len()` bytes starting at `offset`.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Fill `buf` completely or fail with an unexpected EOF.
    async fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read_at(offset, buf).await?;
            if n == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            }
            offset += n as u64;
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}
