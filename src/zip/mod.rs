//! ZIP archives generated on the fly.
//!
//! A generated ZIP file consists of:
//! 1. A local file header and the stored (uncompressed) data for each file
//! 2. The Central Directory, one header per file, in the same order
//! 3. The End of Central Directory (EOCD) record
//!
//! Each entry's CRC-32 is computed from the source before its local header
//! is written, which costs a second read of every file. The CRC and the
//! local header offset are kept in an [`EntryRecord`] until the Central
//! Directory is written.
//!
//! ## Limitations
//!
//! - No compression
//! - No Zip64: files, offsets and the directory must fit in 32 bits, and
//!   there can be at most 65535 entries

mod parser;
mod structures;

pub use parser::ZipParser;
pub use structures::*;

use bytes::Bytes;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::io::{SourceFile, SourceMetadata};
use crate::job::{ArchiveJob, FileEntry};
use crate::sender::SenderConfig;
use crate::stream::ArchiveStream;

/// Bytes one entry adds: local header, central header and payload.
pub fn entry_length(name_len: usize, size: u64) -> u64 {
    (LFH_SIZE + CDFH_MIN_SIZE + 2 * name_len) as u64 + size
}

pub(crate) async fn content_length(job: &ArchiveJob) -> Result<u64> {
    let mut length = 0u64;
    let mut cd_size = 0u64;

    for entry in job {
        let metadata = SourceMetadata::stat(&entry.source_path).await?;
        limit_u32("file size", metadata.size)?;
        length += entry_length(entry.archive_path.len(), metadata.size);
        cd_size += (CDFH_MIN_SIZE + entry.archive_path.len()) as u64;
    }

    limit_u16("entry count", job.len() as u64)?;
    limit_u32("central directory offset", length - cd_size)?;
    limit_u32("central directory size", cd_size)?;

    Ok(length + EndOfCentralDirectory::SIZE as u64)
}

pub(crate) fn stream(entries: Vec<FileEntry>, config: SenderConfig) -> ArchiveStream {
    let cursor = ZipCursor {
        records: Vec::with_capacity(entries.len()),
        entries: entries.into_iter(),
        step: Step::NextEntry,
        config,
        written: 0,
        cd_offset: 0,
        cd_size: 0,
    };
    ArchiveStream::new(futures::stream::try_unfold(cursor, ZipCursor::advance))
}

fn limit_u32(what: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| ArchiveError::ZipLimitExceeded {
        what,
        value,
        max: u64::from(u32::MAX),
    })
}

fn limit_u16(what: &'static str, value: u64) -> Result<u16> {
    u16::try_from(value).map_err(|_| ArchiveError::ZipLimitExceeded {
        what,
        value,
        max: u64::from(u16::MAX),
    })
}

enum Step {
    NextEntry,
    Payload(SourceFile),
    CentralDirectory(usize),
    EndOfCentralDirectory,
    Done,
}

struct ZipCursor {
    entries: std::vec::IntoIter<FileEntry>,
    records: Vec<EntryRecord>,
    step: Step,
    config: SenderConfig,
    written: u64,
    cd_offset: u64,
    cd_size: u64,
}

impl ZipCursor {
    async fn advance(mut self) -> Result<Option<(Bytes, Self)>> {
        loop {
            let chunk = match std::mem::replace(&mut self.step, Step::Done) {
                Step::Done => return Ok(None),
                Step::NextEntry => {
                    let Some(entry) = self.entries.next() else {
                        self.cd_offset = self.written;
                        self.step = Step::CentralDirectory(0);
                        continue;
                    };
                    self.start_entry(entry).await?
                }
                Step::Payload(mut source) => {
                    match source.next_chunk(self.config.chunk_size).await? {
                        Some(chunk) => {
                            self.step = Step::Payload(source);
                            chunk
                        }
                        None => {
                            self.step = Step::NextEntry;
                            continue;
                        }
                    }
                }
                Step::CentralDirectory(i) => match self.records.get(i) {
                    Some(record) => {
                        let header = Bytes::from(record.central_header());
                        self.cd_size += header.len() as u64;
                        self.step = Step::CentralDirectory(i + 1);
                        header
                    }
                    None => {
                        self.step = Step::EndOfCentralDirectory;
                        continue;
                    }
                },
                Step::EndOfCentralDirectory => {
                    let eocd = EndOfCentralDirectory::new(
                        limit_u16("entry count", self.records.len() as u64)?,
                        limit_u32("central directory size", self.cd_size)?,
                        limit_u32("central directory offset", self.cd_offset)?,
                    );
                    let trailer = Bytes::from(eocd.to_bytes());
                    debug!(
                        entries = self.records.len(),
                        bytes = self.written + trailer.len() as u64,
                        "zip archive complete"
                    );
                    trailer
                }
            };

            self.written += chunk.len() as u64;
            return Ok(Some((chunk, self)));
        }
    }

    /// Checksum the next source and emit its local header.
    async fn start_entry(&mut self, entry: FileEntry) -> Result<Bytes> {
        let mut source = SourceFile::open(&entry.source_path).await?;
        let size = limit_u32("file size", source.metadata().size)?;
        let lfh_offset = limit_u32("local header offset", self.written)?;
        let crc32 = source.crc32(self.config.crc_chunk_size).await?;

        let record = EntryRecord {
            name: entry.archive_path,
            modified: DosDateTime::from_system_time(source.metadata().modified),
            crc32,
            size,
            lfh_offset,
        };
        debug!(
            archive_path = %record.name,
            source = %entry.source_path.display(),
            size,
            crc32 = %format!("{crc32:08x}"),
            offset = lfh_offset,
            "adding zip entry"
        );

        let header = Bytes::from(record.local_header());
        self.records.push(record);
        self.step = Step::Payload(source);
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_length_counts_both_headers() {
        assert_eq!(entry_length(5, 10), 76 + 10 + 10);
        assert_eq!(entry_length(0, 0), 76);
    }

    #[test]
    fn limits() {
        assert_eq!(limit_u32("x", 7).unwrap(), 7);
        assert!(matches!(
            limit_u32("file size", 1 << 32),
            Err(ArchiveError::ZipLimitExceeded { what: "file size", .. })
        ));
        assert!(limit_u16("entry count", 65_536).is_err());
    }
}
