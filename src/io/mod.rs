mod local;

pub use local::SourceFile;

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ArchiveError, Result};

/// Mode reported for sources on hosts without Unix permission bits.
pub const DEFAULT_MODE: u32 = 0o100644;

/// The part of a source file's metadata that ends up in archive headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub size: u64,
    pub modified: SystemTime,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl SourceMetadata {
    /// Stat `path` without opening it.
    pub async fn stat(path: &Path) -> Result<Self> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ArchiveError::unavailable(path, e))?;
        Self::from_std(&meta).map_err(|e| ArchiveError::unavailable(path, e))
    }

    /// Only regular files can be archived.
    pub fn from_std(meta: &Metadata) -> io::Result<Self> {
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }

        let modified = meta.modified().unwrap_or(UNIX_EPOCH);

        #[cfg(unix)]
        let (mode, uid, gid) = {
            use std::os::unix::fs::MetadataExt;
            (meta.mode(), meta.uid(), meta.gid())
        };

        #[cfg(not(unix))]
        let (mode, uid, gid) = (DEFAULT_MODE, 0, 0);

        Ok(Self {
            size: meta.len(),
            modified,
            mode,
            uid,
            gid,
        })
    }

    /// Whole seconds since the Unix epoch; times before it count as 0.
    pub fn mtime_secs(&self) -> u64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
