//! Tar archives generated on the fly.
//!
//! Each entry is a 512-byte header, the file payload, and zero padding up
//! to the next 512-byte boundary. Padding is always added: a payload that
//! is already a multiple of 512 bytes is followed by one full zero block.
//! No end-of-archive blocks follow the last entry.
//!
//! [`content_length`] and [`stream`] share [`entry_length`], so the
//! advertised size always matches what gets streamed.

mod header;
mod reader;

pub use header::{BLOCK_SIZE, NAME_LEN, TarHeader, checksum};
pub use reader::{TarEntry, TarReader};

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::io::{SourceFile, SourceMetadata};
use crate::job::{ArchiveJob, FileEntry};
use crate::sender::SenderConfig;
use crate::stream::ArchiveStream;

/// Zero bytes written after a payload of `size` bytes. Never 0.
pub fn padding_len(size: u64) -> u64 {
    BLOCK_SIZE as u64 - size % BLOCK_SIZE as u64
}

/// Bytes one entry occupies: header, payload and padding.
pub fn entry_length(size: u64) -> u64 {
    BLOCK_SIZE as u64 + size + padding_len(size)
}

pub(crate) async fn content_length(job: &ArchiveJob) -> Result<u64> {
    let mut length = 0;
    for entry in job {
        let metadata = SourceMetadata::stat(&entry.source_path).await?;
        // fail here rather than after Content-Length has gone out
        TarHeader::new(&entry.archive_path, &metadata).encode()?;
        length += entry_length(metadata.size);
    }
    Ok(length)
}

pub(crate) fn stream(entries: Vec<FileEntry>, config: SenderConfig) -> ArchiveStream {
    let cursor = TarCursor {
        entries: entries.into_iter(),
        step: Step::NextEntry,
        chunk_size: config.chunk_size,
        count: 0,
        written: 0,
    };
    ArchiveStream::new(futures::stream::try_unfold(cursor, TarCursor::advance))
}

enum Step {
    NextEntry,
    Payload(SourceFile),
    Done,
}

struct TarCursor {
    entries: std::vec::IntoIter<FileEntry>,
    step: Step,
    chunk_size: usize,
    count: usize,
    written: u64,
}

impl TarCursor {
    async fn advance(mut self) -> Result<Option<(Bytes, Self)>> {
        let chunk = match std::mem::replace(&mut self.step, Step::Done) {
            Step::Done => return Ok(None),
            Step::NextEntry => {
                let Some(entry) = self.entries.next() else {
                    debug!(entries = self.count, bytes = self.written, "tar archive complete");
                    return Ok(None);
                };

                let source = SourceFile::open(&entry.source_path).await?;
                let block = TarHeader::new(&entry.archive_path, source.metadata()).encode()?;
                debug!(
                    archive_path = %entry.archive_path,
                    source = %entry.source_path.display(),
                    size = source.metadata().size,
                    "adding tar entry"
                );

                self.count += 1;
                self.step = Step::Payload(source);
                Bytes::copy_from_slice(&block)
            }
            Step::Payload(mut source) => match source.next_chunk(self.chunk_size).await? {
                Some(chunk) => {
                    self.step = Step::Payload(source);
                    chunk
                }
                None => {
                    let padding = padding_len(source.metadata().size) as usize;
                    self.step = Step::NextEntry;
                    Bytes::from(vec![0u8; padding])
                }
            },
        };

        self.written += chunk.len() as u64;
        Ok(Some((chunk, self)))
    }
}
