use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::checksum::CRC32_CHUNK_SIZE;
use crate::error::{ArchiveError, Result};
use crate::job::{ArchiveJob, FileEntry};
use crate::stream::ArchiveStream;
use crate::{tar, zip};

/// Payload read size: 4 MiB.
pub const CHUNK_SIZE: usize = 4_194_304;

/// Archive container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "application/x-tar",
            ArchiveFormat::Zip => "application/zip",
        }
    }

    /// Suggested download name.
    pub fn archive_name(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "archive.tar",
            ArchiveFormat::Zip => "archive.zip",
        }
    }

    /// Longest archive path the format's headers can carry.
    pub fn max_path_len(&self) -> usize {
        match self {
            ArchiveFormat::Tar => tar::NAME_LEN,
            ArchiveFormat::Zip => zip::MAX_NAME_LEN,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Tar => f.write_str("tar"),
            ArchiveFormat::Zip => f.write_str("zip"),
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tar" => Ok(ArchiveFormat::Tar),
            "zip" => Ok(ArchiveFormat::Zip),
            other => Err(ArchiveError::InvalidConfig(format!(
                "unknown archive format {other:?}"
            ))),
        }
    }
}

/// Read sizes used while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderConfig {
    /// Bytes read from a source per payload chunk.
    pub chunk_size: usize,
    /// Bytes read per step while computing a CRC-32.
    pub crc_chunk_size: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            crc_chunk_size: CRC32_CHUNK_SIZE,
        }
    }
}

impl SenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ArchiveError::InvalidConfig("chunk size must be non-zero".into()));
        }
        if self.crc_chunk_size == 0 {
            return Err(ArchiveError::InvalidConfig(
                "CRC chunk size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Builds one archive of local files and streams it.
///
/// Files are registered with [`add_file`](Self::add_file); nothing is read
/// until [`content_length`](Self::content_length) stats them or the stream
/// from [`generator`](Self::generator) is polled.
#[derive(Debug, Clone)]
pub struct ArchiveSender {
    format: ArchiveFormat,
    job: ArchiveJob,
    config: SenderConfig,
}

impl ArchiveSender {
    pub fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            job: ArchiveJob::new(),
            config: SenderConfig::default(),
        }
    }

    pub fn tar() -> Self {
        Self::new(ArchiveFormat::Tar)
    }

    pub fn zip() -> Self {
        Self::new(ArchiveFormat::Zip)
    }

    pub fn with_config(format: ArchiveFormat, config: SenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            format,
            job: ArchiveJob::new(),
            config,
        })
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Register `source_path` under `archive_path`, replacing any earlier
    /// source for that path. The source is not touched here.
    pub fn add_file(
        &mut self,
        archive_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Result<()> {
        let archive_path = archive_path.into();
        self.check_archive_path(&archive_path)?;
        self.job.insert(archive_path, source_path.into());
        Ok(())
    }

    fn check_archive_path(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(ArchiveError::EmptyArchivePath);
        }
        if !path.is_ascii() {
            return Err(ArchiveError::NonAsciiArchivePath(path.to_string()));
        }
        let max = self.format.max_path_len();
        if path.len() > max {
            return Err(ArchiveError::ArchivePathTooLong {
                path: path.to_string(),
                len: path.len(),
                max,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.job.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.job.iter()
    }

    /// Exact size of the archive, computed from file metadata alone.
    pub async fn content_length(&self) -> Result<Option<u64>> {
        let length = match self.format {
            ArchiveFormat::Tar => tar::content_length(&self.job).await?,
            ArchiveFormat::Zip => zip::content_length(&self.job).await?,
        };
        Ok(Some(length))
    }

    /// The archive bytes. Consumes the sender; build a new one to stream again.
    pub fn generator(self) -> ArchiveStream {
        let entries = self.job.into_entries();
        match self.format {
            ArchiveFormat::Tar => tar::stream(entries, self.config),
            ArchiveFormat::Zip => zip::stream(entries, self.config),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn archive_name(&self) -> &'static str {
        self.format.archive_name()
    }

    /// Everything an HTTP layer needs to send this archive as a download.
    pub async fn into_response(self) -> Result<ArchiveResponse> {
        let content_length = self.content_length().await?;
        Ok(ArchiveResponse {
            mime_type: self.mime_type(),
            content_disposition: format!("attachment; filename=\"{}\"", self.archive_name()),
            content_length,
            body: self.generator(),
        })
    }
}

/// A streamed archive download.
#[derive(Debug)]
pub struct ArchiveResponse {
    pub mime_type: &'static str,
    pub content_disposition: String,
    /// When present, `body` yields exactly this many bytes.
    pub content_length: Option<u64>,
    pub body: ArchiveStream,
}

impl ArchiveResponse {
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Content-Type", self.mime_type.to_string()),
            ("Content-Disposition", self.content_disposition.clone()),
        ];
        if let Some(length) = self.content_length {
            headers.push(("Content-Length", length.to_string()));
        }
        headers
    }
}
