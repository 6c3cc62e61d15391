//! Block-wise CRC-32 over files that may not fit in memory.

use std::io;
use std::path::Path;

use crc32fast::Hasher;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ArchiveError, Result};

/// Read size used when checksumming.
pub const CRC32_CHUNK_SIZE: usize = 65_536;

/// CRC-32 (IEEE) of everything `reader` yields, read `chunk_size` bytes at a time.
pub async fn crc32_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    chunk_size: usize,
) -> io::Result<u32> {
    let mut hasher = Hasher::new();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize())
}

/// CRC-32 of the file at `path`.
pub async fn crc32_file(path: &Path, chunk_size: usize) -> Result<u32> {
    let file = File::open(path)
        .await
        .map_err(|e| ArchiveError::unavailable(path, e))?;
    crc32_reader(file, chunk_size)
        .await
        .map_err(|e| ArchiveError::unavailable(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_one_shot_hash_across_chunk_boundaries() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let expected = crc32fast::hash(&data);

        for chunk in [1, 7, 4096, CRC32_CHUNK_SIZE, 1 << 20] {
            let crc = crc32_reader(&data[..], chunk).await.unwrap();
            assert_eq!(crc, expected, "chunk size {chunk}");
        }
    }

    #[tokio::test]
    async fn empty_input_is_zero() {
        assert_eq!(crc32_reader(&b""[..], 16).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn known_vector() {
        let crc = crc32_reader(&b"123456789"[..], 4).await.unwrap();
        assert_eq!(crc, 0xCBF4_3926);
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = crc32_file(&dir.path().join("nope"), 16).await.unwrap_err();
        assert!(matches!(err, ArchiveError::SourceUnavailable { .. }));
    }
}
