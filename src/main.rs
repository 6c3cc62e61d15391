//! Main entry point for the flyarchive CLI application.
//!
//! Builds an archive from the files named on the command line and streams
//! it to a file or stdout, or lists an archive produced earlier.

use anyhow::{Context, Result, anyhow, bail};
use chrono::DateTime;
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flyarchive::cli::parse_entry;
use flyarchive::{ArchiveFormat, ArchiveSender, Cli, TarReader, ZipParser, stream};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Some(ref archive) = cli.list {
        return list_archive(archive, cli.format.into()).await;
    }

    let mut sender = ArchiveSender::with_config(cli.format.into(), cli.sender_config())?;
    for arg in &cli.entries {
        let (name, path) = parse_entry(arg)
            .ok_or_else(|| anyhow!("invalid entry {arg:?}, expected NAME=PATH or PATH"))?;
        sender
            .add_file(name, path)
            .with_context(|| format!("cannot add {arg}"))?;
    }

    if cli.length {
        let length = sender.content_length().await?;
        match length {
            Some(length) => println!("{length}"),
            None => println!("unknown"),
        }
        return Ok(());
    }

    let response = sender.into_response().await?;

    if cli.headers {
        for (name, value) in response.headers() {
            println!("{name}: {value}");
        }
        return Ok(());
    }

    let advertised = response.content_length;
    let written = match cli.output {
        Some(ref path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?;
            stream::write_all(response.body, &mut file).await?
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stream::write_all(response.body, &mut stdout).await?
        }
    };

    if let Some(advertised) = advertised
        && written != advertised
    {
        bail!("wrote {written} bytes but advertised {advertised}");
    }

    info!(bytes = written, "archive written");
    if let Some(ref path) = cli.output
        && !cli.quiet
    {
        eprintln!("{}: {}", path.display(), format_size(written));
    }

    Ok(())
}

/// Install the stderr log subscriber. RUST_LOG wins over -v/-q.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the entries of a produced archive as a table.
///
/// The whole archive is read into memory first; listing is meant for
/// archives this tool produced, not for arbitrarily large files.
async fn list_archive(path: &Path, format: ArchiveFormat) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Date", "Time");
    println!("{}", "-".repeat(50));

    let mut total = 0u64;
    let mut count = 0usize;

    match format {
        ArchiveFormat::Tar => {
            for entry in TarReader::new(&data).list_files()? {
                let header = &entry.header;
                let (date, time) = DateTime::from_timestamp(header.mtime as i64, 0)
                    .map(|t| {
                        (
                            t.format("%Y-%m-%d").to_string(),
                            t.format("%H:%M").to_string(),
                        )
                    })
                    .unwrap_or_default();
                println!("{:>10}  {:>10}  {:>5}  {}", header.size, date, time, header.path);
                total += header.size;
                count += 1;
            }
        }
        ArchiveFormat::Zip => {
            for entry in ZipParser::new(&data).list_files()? {
                let (year, month, day) = entry.mod_date();
                let (hour, minute, _second) = entry.mod_time();
                println!(
                    "{:>10}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                    entry.uncompressed_size, year, month, day, hour, minute, entry.file_name
                );
                total += entry.uncompressed_size;
                count += 1;
            }
        }
    }

    println!("{}", "-".repeat(50));
    println!("{:>10}  {:>19}  {} files", total, "", count);

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
