use super::header::{BLOCK_SIZE, TarHeader};
use super::padding_len;
use crate::error::{ArchiveError, Result};

/// An entry found in a tar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    pub header: TarHeader,
    /// Offset of the first payload byte.
    pub data_offset: u64,
}

/// Reads back tar archives written by this crate.
///
/// Records are walked with the same always-pad rule the writer uses, so
/// this is not a general tar reader.
pub struct TarReader<'a> {
    data: &'a [u8],
}

impl<'a> TarReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// All entries, in archive order.
    pub fn list_files(&self) -> Result<Vec<TarEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        while offset < self.data.len() {
            let header = TarHeader::parse(&self.data[offset..])?;
            let data_offset = offset + BLOCK_SIZE;
            let record = header.size + padding_len(header.size);
            let end = data_offset as u64 + record;

            if end > self.data.len() as u64 {
                return Err(ArchiveError::Malformed(format!(
                    "tar entry {} runs past the end of the archive",
                    header.path
                )));
            }

            entries.push(TarEntry {
                header,
                data_offset: data_offset as u64,
            });
            offset = end as usize;
        }

        Ok(entries)
    }

    /// Payload bytes of `entry`.
    pub fn read(&self, entry: &TarEntry) -> &'a [u8] {
        let start = entry.data_offset as usize;
        &self.data[start..start + entry.header.size as usize]
    }
}
