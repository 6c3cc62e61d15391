use crate::error::{ArchiveError, Result};
use crate::io::SourceMetadata;

/// Size of a tar header and of the records payloads are padded to.
pub const BLOCK_SIZE: usize = 512;

/// Longest archive path the name field holds.
pub const NAME_LEN: usize = 100;

const MODE: (usize, usize) = (100, 7);
const UID: (usize, usize) = (108, 7);
const GID: (usize, usize) = (116, 7);
const SIZE: (usize, usize) = (124, 11);
const MTIME: (usize, usize) = (136, 11);
const CHECKSUM: (usize, usize) = (148, 6);
const TYPE_FLAG: usize = 156;

/// Type flag of a regular file.
const REGULAR_FILE: u8 = b'0';

/// Header for one regular file in a tar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    pub path: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: u64,
}

impl TarHeader {
    pub fn new(path: &str, metadata: &SourceMetadata) -> Self {
        Self {
            path: path.to_string(),
            mode: metadata.mode,
            uid: metadata.uid,
            gid: metadata.gid,
            size: metadata.size,
            mtime: metadata.mtime_secs(),
        }
    }

    /// Encode the 512-byte header block.
    pub fn encode(&self) -> Result<[u8; BLOCK_SIZE]> {
        if self.path.len() > NAME_LEN {
            return Err(ArchiveError::ArchivePathTooLong {
                path: self.path.clone(),
                len: self.path.len(),
                max: NAME_LEN,
            });
        }

        let mut block = [0u8; BLOCK_SIZE];
        block[..self.path.len()].copy_from_slice(self.path.as_bytes());

        write_octal(&mut block, "mode", MODE, u64::from(self.mode))?;
        write_octal(&mut block, "uid", UID, u64::from(self.uid))?;
        write_octal(&mut block, "gid", GID, u64::from(self.gid))?;
        write_octal(&mut block, "size", SIZE, self.size)?;
        write_octal(&mut block, "mtime", MTIME, self.mtime)?;
        block[TYPE_FLAG] = REGULAR_FILE;

        let sum = checksum(&block);
        write_octal(&mut block, "checksum", CHECKSUM, u64::from(sum))?;
        // NUL is already at 154
        block[155] = b' ';

        Ok(block)
    }

    /// Decode a header block, verifying its checksum.
    pub fn parse(block: &[u8]) -> Result<Self> {
        if block.len() < BLOCK_SIZE {
            return Err(ArchiveError::Malformed(format!(
                "tar header needs {BLOCK_SIZE} bytes, got {}",
                block.len()
            )));
        }

        let stored = read_octal(block, "checksum", CHECKSUM)?;
        let actual = u64::from(checksum(block));
        if stored != actual {
            return Err(ArchiveError::Malformed(format!(
                "tar header checksum {stored:o} does not match computed {actual:o}"
            )));
        }

        let name = &block[..NAME_LEN];
        let name_len = name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let path = std::str::from_utf8(&name[..name_len])
            .map_err(|_| ArchiveError::Malformed("tar name is not valid UTF-8".into()))?
            .to_string();

        Ok(Self {
            path,
            mode: read_octal(block, "mode", MODE)? as u32,
            uid: read_octal(block, "uid", UID)? as u32,
            gid: read_octal(block, "gid", GID)? as u32,
            size: read_octal(block, "size", SIZE)?,
            mtime: read_octal(block, "mtime", MTIME)?,
        })
    }
}

/// Header checksum: the byte sum with the checksum field read as eight spaces.
pub fn checksum(block: &[u8]) -> u32 {
    let (start, _) = CHECKSUM;
    let head: u32 = block[..start].iter().map(|&b| u32::from(b)).sum();
    let tail: u32 = block[start + 8..BLOCK_SIZE].iter().map(|&b| u32::from(b)).sum();
    head + tail + 8 * u32::from(b' ')
}

fn write_octal(
    block: &mut [u8; BLOCK_SIZE],
    field: &'static str,
    (offset, digits): (usize, usize),
    value: u64,
) -> Result<()> {
    let text = format!("{value:0digits$o}");
    if text.len() > digits {
        return Err(ArchiveError::FieldOverflow {
            field,
            value,
            digits,
        });
    }
    block[offset..offset + digits].copy_from_slice(text.as_bytes());
    Ok(())
}

fn read_octal(block: &[u8], field: &'static str, (offset, digits): (usize, usize)) -> Result<u64> {
    let raw = &block[offset..offset + digits];
    let text = std::str::from_utf8(raw)
        .map_err(|_| ArchiveError::Malformed(format!("tar field {field} is not ASCII")))?;
    let text = text.trim_matches(|c| c == '\0' || c == ' ');
    if text.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(text, 8)
        .map_err(|_| ArchiveError::Malformed(format!("tar field {field} is not octal: {text:?}")))
}
