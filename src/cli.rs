use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::checksum::CRC32_CHUNK_SIZE;
use crate::sender::{ArchiveFormat, CHUNK_SIZE, SenderConfig};

#[derive(Parser, Debug)]
#[command(name = "flyarchive")]
#[command(version)]
#[command(about = "Stream a TAR or ZIP archive of local files", long_about = None)]
#[command(after_help = "Examples:\n  \
  flyarchive -f zip -o out.zip scans/a.png=/data/a.png   store /data/a.png as scans/a.png\n  \
  flyarchive --length notes.txt data.bin                 print the archive size only\n  \
  flyarchive -f zip -l out.zip                           list a produced archive")]
pub struct Cli {
    /// Files to archive, as NAME=PATH or PATH
    #[arg(value_name = "ENTRY", required_unless_present = "list")]
    pub entries: Vec<String>,

    /// Archive format
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Tar)]
    pub format: Format,

    /// Write the archive to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the archive length without streaming it
    #[arg(long, conflicts_with = "headers")]
    pub length: bool,

    /// Print the HTTP response headers without streaming
    #[arg(long)]
    pub headers: bool,

    /// List the entries of an archive produced by this tool
    #[arg(short = 'l', long, value_name = "ARCHIVE", conflicts_with = "entries")]
    pub list: Option<PathBuf>,

    /// Bytes read from a source file per chunk
    #[arg(long, value_name = "BYTES", default_value_t = CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Bytes read per step while computing CRC-32
    #[arg(long, value_name = "BYTES", default_value_t = CRC32_CHUNK_SIZE)]
    pub crc_chunk_size: usize,

    /// More logging (-vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Tar,
    Zip,
}

impl From<Format> for ArchiveFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Tar => ArchiveFormat::Tar,
            Format::Zip => ArchiveFormat::Zip,
        }
    }
}

impl Cli {
    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            chunk_size: self.chunk_size,
            crc_chunk_size: self.crc_chunk_size,
        }
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

/// Split an `ENTRY` argument into its archive path and source path.
///
/// `NAME=PATH` stores PATH as NAME; a bare PATH is stored under its file name.
pub fn parse_entry(arg: &str) -> Option<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Some((name.to_string(), PathBuf::from(path)))
        }
        Some(_) => None,
        None => {
            let path = Path::new(arg);
            let name = path.file_name()?.to_str()?.to_string();
            Some((name, path.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_arguments() {
        assert_eq!(
            parse_entry("scans/a.png=/data/a.png"),
            Some(("scans/a.png".to_string(), PathBuf::from("/data/a.png")))
        );
        assert_eq!(
            parse_entry("/data/notes.txt"),
            Some(("notes.txt".to_string(), PathBuf::from("/data/notes.txt")))
        );
        assert_eq!(parse_entry("=/data/a.png"), None);
        assert_eq!(parse_entry("a.png="), None);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["flyarchive", "-f", "zip", "-vv", "a=b"]);
        assert_eq!(cli.format, Format::Zip);
        assert_eq!(cli.log_filter(), "debug");
        assert_eq!(cli.sender_config(), SenderConfig::default());

        let cli = Cli::parse_from(["flyarchive", "-l", "out.tar"]);
        assert!(cli.entries.is_empty());
        assert_eq!(cli.list, Some(PathBuf::from("out.tar")));
    }
}
