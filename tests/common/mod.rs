#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use flyarchive::{ArchiveFormat, ArchiveSender, SenderConfig, stream};

/// Deterministic, non-repeating-looking payload of `len` bytes.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32) as u8)
        .collect()
}

pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

pub fn small_chunks(format: ArchiveFormat) -> ArchiveSender {
    ArchiveSender::with_config(
        format,
        SenderConfig {
            chunk_size: 100,
            crc_chunk_size: 33,
        },
    )
    .unwrap()
}

/// Advertised length and streamed bytes of `sender`.
pub async fn produce(sender: ArchiveSender) -> (Option<u64>, Vec<u8>) {
    let length = sender.content_length().await.unwrap();
    let mut out = Vec::new();
    let written = stream::write_all(sender.generator(), &mut out).await.unwrap();
    assert_eq!(written, out.len() as u64);
    (length, out)
}
