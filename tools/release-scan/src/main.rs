//! Bulk Release Scanner
//!
//! Reads release names (one per line) from a file or stdin, parses them
//! concurrently and prints one JSON document per line. Lines carry their
//! assignment id so downstream consumers can restore input order.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use kiriwake::{CancelToken, Release, ReleaseScanner, TagParser, taginfo};
use serde::Serialize;
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "release-scan")]
#[command(about = "Parse release names in bulk, emitting JSON lines")]
#[command(version)]
struct Cli {
    /// Input file with one release name per line (defaults to stdin)
    input: Option<PathBuf>,

    /// Number of parser workers (defaults to the CPU count)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Extra tag registry CSV merged over the embedded one
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Pretty-print each JSON document
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct ScanOutput {
    id: u64,
    input: String,
    release: Release,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let infos = match &cli.registry {
        Some(path) => {
            let extra = taginfo::load_file(path)
                .with_context(|| format!("loading registry {}", path.display()))?;
            taginfo::all(&[extra])?
        }
        None => taginfo::all(&[])?,
    };
    let parser = TagParser::new(infos).context("building parser")?;
    let scanner = match cli.workers {
        Some(workers) => ReleaseScanner::with_workers(parser, workers),
        None => ReleaseScanner::new(parser),
    };
    info!(workers = scanner.workers(), "scanning");

    let reader: Box<dyn BufRead + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let cancel = CancelToken::new();
    let mut stream = scanner.scan_reader(reader, cancel);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0u64;
    for scan in &mut stream {
        let doc = ScanOutput {
            id: scan.id,
            input: scan.line,
            release: scan.release,
        };
        let json = if cli.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        writeln!(out, "{json}")?;
        count += 1;
    }
    info!(count, "done");

    let errors = stream.errors();
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("error: {err}");
        }
        bail!("{} line(s) failed", errors.len());
    }
    Ok(())
}
