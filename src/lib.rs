//! # flyarchive
//!
//! Streams TAR and ZIP archives of local files on the fly.
//!
//! An archive is never assembled in memory: an [`ArchiveSender`] yields it
//! as a stream of chunks that can be handed straight to an HTTP response
//! body. The exact length of the archive is known before streaming starts,
//! so it can be advertised up front.
//!
//! ## Features
//!
//! - TAR and ZIP output, entries stored without compression
//! - Bounded memory: payloads are read in fixed-size chunks
//! - Exact `Content-Length` computed from file metadata alone
//! - Readers to list archives produced by this crate
//!
//! ## Example
//!
//! ```no_run
//! use flyarchive::{ArchiveSender, stream};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut sender = ArchiveSender::zip();
//!     sender.add_file("scans/front.png", "/data/acq/42/front.png")?;
//!     sender.add_file("scans/back.png", "/data/acq/42/back.png")?;
//!
//!     let length = sender.content_length().await?;
//!     println!("{} bytes", length.unwrap_or_default());
//!
//!     let mut out = tokio::fs::File::create(sender.archive_name()).await?;
//!     stream::write_all(sender.generator(), &mut out).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod cli;
pub mod error;
pub mod io;
pub mod job;
pub mod sender;
pub mod stream;
pub mod tar;
pub mod zip;

pub use cli::Cli;
pub use error::{ArchiveError, Result};
pub use io::{SourceFile, SourceMetadata};
pub use job::{ArchiveJob, FileEntry};
pub use sender::{ArchiveFormat, ArchiveResponse, ArchiveSender, SenderConfig};
pub use stream::ArchiveStream;
pub use tar::{TarEntry, TarReader};
pub use zip::{ZipFileEntry, ZipParser};
