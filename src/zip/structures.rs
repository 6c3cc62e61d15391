use std::io::Cursor;
use std::time::SystemTime;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};

use crate::error::{ArchiveError, Result};

/// "Version needed to extract" and "version made by": 1.0, stored entries only.
pub const VERSION: u16 = 10;

/// Longest archive path the 16-bit name length fields allow.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// MS-DOS packed modification time and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const MIN: DosDateTime = DosDateTime {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// 2107-12-31 23:59:58, the latest representable instant.
    pub const MAX: DosDateTime = DosDateTime {
        time: (23 << 11) | (59 << 5) | 29,
        date: (127 << 9) | (12 << 5) | 31,
    };

    /// Pack a file modification time, rendered in the local time zone.
    pub fn from_system_time(time: SystemTime) -> Self {
        let local: DateTime<Local> = time.into();
        Self::from_naive(local.naive_local())
    }

    pub fn from_naive(dt: NaiveDateTime) -> Self {
        match dt.year() {
            ..1980 => Self::MIN,
            2108.. => Self::MAX,
            year => Self {
                time: ((dt.second() / 2) | (dt.minute() << 5) | (dt.hour() << 11)) as u16,
                date: (dt.day() | (dt.month() << 5) | (((year - 1980) as u32) << 9)) as u16,
            },
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk record without a comment.
    pub fn new(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ArchiveError::Malformed(
                "invalid end of central directory".into(),
            ));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        buf[0..4].copy_from_slice(Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], self.disk_number);
        LittleEndian::write_u16(&mut buf[6..8], self.disk_with_cd);
        LittleEndian::write_u16(&mut buf[8..10], self.disk_entries);
        LittleEndian::write_u16(&mut buf[10..12], self.total_entries);
        LittleEndian::write_u32(&mut buf[12..16], self.cd_size);
        LittleEndian::write_u32(&mut buf[16..20], self.cd_offset);
        LittleEndian::write_u16(&mut buf[20..22], self.comment_len);
        buf
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// What one stored entry contributes to both of its headers.
///
/// Built once per entry, before its local header is written, and kept
/// until the central directory is written so both headers carry the same
/// CRC and offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub name: String,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub size: u32,
    pub lfh_offset: u32,
}

impl EntryRecord {
    pub fn local_header(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut buf = vec![0u8; LFH_SIZE + name.len()];

        buf[0..4].copy_from_slice(LFH_SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], VERSION);
        // flags 6..8 and method 8..10 stay zero
        LittleEndian::write_u16(&mut buf[10..12], self.modified.time);
        LittleEndian::write_u16(&mut buf[12..14], self.modified.date);
        LittleEndian::write_u32(&mut buf[14..18], self.crc32);
        LittleEndian::write_u32(&mut buf[18..22], self.size);
        LittleEndian::write_u32(&mut buf[22..26], self.size);
        LittleEndian::write_u16(&mut buf[26..28], name.len() as u16);
        buf[LFH_SIZE..].copy_from_slice(name);

        buf
    }

    pub fn central_header(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut buf = vec![0u8; CDFH_MIN_SIZE + name.len()];

        buf[0..4].copy_from_slice(CDFH_SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], VERSION);
        LittleEndian::write_u16(&mut buf[6..8], VERSION);
        LittleEndian::write_u16(&mut buf[12..14], self.modified.time);
        LittleEndian::write_u16(&mut buf[14..16], self.modified.date);
        LittleEndian::write_u32(&mut buf[16..20], self.crc32);
        LittleEndian::write_u32(&mut buf[20..24], self.size);
        LittleEndian::write_u32(&mut buf[24..28], self.size);
        LittleEndian::write_u16(&mut buf[28..30], name.len() as u16);
        // extra, comment, disk, internal and external attributes stay zero
        LittleEndian::write_u32(&mut buf[42..46], self.lfh_offset);
        buf[CDFH_MIN_SIZE..].copy_from_slice(name);

        buf
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
