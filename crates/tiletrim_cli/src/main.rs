//! tiletrim
//!
//! Trims a clustered PMTiles archive down to a maximum zoom level,
//! producing a smaller, self-contained archive:
//!
//! ```text
//! tiletrim world.pmtiles overview.pmtiles 8
//! ```

use clap::Parser;
use std::path::PathBuf;
use tiletrim_core::{trim, TrimOptions};
use tiletrim_storage::FileBackend;
use tracing_subscriber::EnvFilter;

/// Trim a PMTiles archive down to a maximum zoom level.
#[derive(Parser)]
#[command(name = "tiletrim", version, about, long_about = None)]
struct Cli {
    /// Source archive
    input: PathBuf,

    /// Destination archive (created, or truncated if present)
    output: PathBuf,

    /// Highest zoom level to keep
    #[arg(value_parser = clap::value_parser!(u8).range(0..=31))]
    max_zoom: u8,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(&cli) {
        eprintln!("tiletrim: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = FileBackend::open(&cli.input)?;
    let mut dest = FileBackend::create(&cli.output)?;

    let summary = trim(&source, &mut dest, TrimOptions::new(cli.max_zoom))?;

    println!(
        "{}: max zoom {}, {} entries, {} tile contents, {} tile data bytes",
        cli.output.display(),
        summary.max_zoom,
        summary.tile_entries,
        summary.tile_contents,
        summary.tile_data_length,
    );
    Ok(())
}
