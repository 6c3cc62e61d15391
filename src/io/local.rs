use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::SourceMetadata;
use crate::checksum;
use crate::error::{ArchiveError, Result};

/// An open source file being copied into an archive.
///
/// The size captured when the file is opened is the size written into the
/// entry's header, so reads stop there even if the file has grown since.
pub struct SourceFile {
    path: PathBuf,
    file: File,
    metadata: SourceMetadata,
    read: u64,
}

impl SourceFile {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| ArchiveError::unavailable(path, e))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| ArchiveError::unavailable(path, e))?;
        let metadata =
            SourceMetadata::from_std(&meta).map_err(|e| ArchiveError::unavailable(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            metadata,
            read: 0,
        })
    }

    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// CRC-32 of the payload, leaving the file positioned at its start.
    pub async fn crc32(&mut self, chunk_size: usize) -> Result<u32> {
        let payload = (&mut self.file).take(self.metadata.size);
        let crc = checksum::crc32_reader(payload, chunk_size)
            .await
            .map_err(|e| ArchiveError::unavailable(&self.path, e))?;

        self.file
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|e| ArchiveError::unavailable(&self.path, e))?;
        self.read = 0;

        Ok(crc)
    }

    /// Next chunk of at most `chunk_size` bytes, `None` once the recorded size was read.
    pub async fn next_chunk(&mut self, chunk_size: usize) -> Result<Option<Bytes>> {
        let remaining = self.metadata.size - self.read;
        if remaining == 0 {
            return Ok(None);
        }

        let want = remaining.min(chunk_size as u64) as usize;
        let mut buf = BytesMut::zeroed(want);
        let mut filled = 0;

        while filled < want {
            let n = self
                .file
                .read(&mut buf[filled..])
                .await
                .map_err(|e| ArchiveError::unavailable(&self.path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Err(ArchiveError::SourceTruncated {
                path: self.path.clone(),
                expected: self.metadata.size,
                read: self.read,
            });
        }

        buf.truncate(filled);
        self.read += filled as u64;
        Ok(Some(buf.freeze()))
    }
}
