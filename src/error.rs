use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while registering, measuring, streaming or reading archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Archive paths must name something.
    #[error("archive path is empty")]
    EmptyArchivePath,

    /// Header fields only carry ASCII names.
    #[error("archive path {0:?} is not ASCII")]
    NonAsciiArchivePath(String),

    /// The name does not fit the format's path field.
    #[error("archive path {path:?} is {len} bytes, the limit is {max}")]
    ArchivePathTooLong { path: String, len: usize, max: usize },

    /// The source file is missing, unreadable, or was deleted.
    #[error("source file {path} is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source file shrank after its header was emitted.
    #[error("source file {path} ended after {read} of {expected} bytes")]
    SourceTruncated {
        path: PathBuf,
        expected: u64,
        read: u64,
    },

    /// A numeric value does not fit its octal tar header field.
    #[error("tar field {field} cannot hold {value} in {digits} octal digits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        digits: usize,
    },

    /// The archive needs Zip64, which is not supported.
    #[error("{what} of {value} exceeds the ZIP limit of {max}")]
    ZipLimitExceeded {
        what: &'static str,
        value: u64,
        max: u64,
    },

    /// Bytes handed to a reader are not an archive this crate understands.
    #[error("malformed archive: {0}")]
    Malformed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ArchiveError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
