//! Reads back ZIP archives held in memory.
//!
//! ZIP files are read from the end: find the End of Central Directory,
//! then walk the Central Directory it points at. Zip64 is not supported,
//! matching what the writer produces.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::structures::*;
use crate::error::{ArchiveError, Result};

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: usize = 65535;

/// ZIP parser over a complete archive.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find and parse the End of Central Directory record, with its offset.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            return Err(malformed("too short for an end of central directory"));
        }

        // Common case: no archive comment.
        let offset = size - EndOfCentralDirectory::SIZE;
        let tail = &self.data[offset..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            let eocd = EndOfCentralDirectory::from_bytes(tail)?;
            return Ok((eocd, offset as u64));
        }

        let search_start = size - (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(size);
        for i in (search_start..=offset).rev() {
            if &self.data[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len =
                    u16::from_le_bytes([self.data[i + 20], self.data[i + 21]]) as usize;
                if comment_len == size - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&self.data[i..])?;
                    return Ok((eocd, i as u64));
                }
            }
        }

        Err(malformed("no end of central directory found"))
    }

    /// Every entry in the Central Directory, in directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let cd_start = eocd.cd_offset as usize;
        let cd_end = cd_start + eocd.cd_size as usize;
        if cd_end as u64 > eocd_offset {
            return Err(malformed("central directory overlaps its end record"));
        }

        let mut cursor = Cursor::new(&self.data[cd_start..cd_end]);
        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        for _ in 0..eocd.total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        if cursor.position() != eocd.cd_size as u64 {
            return Err(malformed("central directory size does not match its entries"));
        }

        Ok(entries)
    }

    /// Offset of the first payload byte of `entry`, read from its local header.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let start = entry.lfh_offset as usize;
        let lfh = self
            .data
            .get(start..start + LFH_SIZE)
            .ok_or_else(|| malformed("local file header out of bounds"))?;

        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(malformed("invalid local file header"));
        }

        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// CRC-32 recorded in the local header of `entry`.
    pub fn local_crc32(&self, entry: &ZipFileEntry) -> Result<u32> {
        let start = entry.lfh_offset as usize;
        let field = self
            .data
            .get(start + 14..start + 18)
            .ok_or_else(|| malformed("local file header out of bounds"))?;
        Ok(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
    }

    /// Stored payload of `entry`.
    pub fn read(&self, entry: &ZipFileEntry) -> Result<&'a [u8]> {
        if entry.compression_method != CompressionMethod::Stored {
            return Err(malformed(&format!(
                "unsupported compression method {}",
                entry.compression_method.as_u16()
            )));
        }

        let start = self.get_data_offset(entry)? as usize;
        self.data
            .get(start..start + entry.compressed_size as usize)
            .ok_or_else(|| malformed("entry data out of bounds"))
    }
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(malformed("invalid central directory file header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

    cursor.set_position(
        cursor.position() + extra_field_length as u64 + file_comment_length as u64,
    );

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
    })
}

fn malformed(msg: &str) -> ArchiveError {
    ArchiveError::Malformed(msg.to_string())
}
