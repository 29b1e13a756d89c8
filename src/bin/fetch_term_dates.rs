use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use termdates::fetch::{FetchOutcome, download_sources};
use termdates::{Config, ExtractError};

#[derive(Debug, Parser)]
#[command(about = "Download term-date PDFs into the local cache.")]
struct Args {
    /// TOML file listing sources.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to save PDFs.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Download again even when a cached copy exists.
    #[arg(long)]
    force: bool,
}

fn main() -> Result<(), ExtractError> {
    termdates::logging::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let cache_dir = args.cache_dir.clone().unwrap_or_else(|| config.cache_dir());

    let outcomes = download_sources(&config.sources, &cache_dir, args.force, report_progress);
    let mut failed = 0;
    for (academic_year, outcome) in &outcomes {
        match outcome {
            FetchOutcome::Skipped(path) => println!("Skipping existing PDF: {}", path.display()),
            FetchOutcome::Downloaded(path) => {
                println!();
                println!("Downloaded {academic_year} -> {}", path.display());
            }
            FetchOutcome::Failed(err) => {
                println!();
                println!("Failed {academic_year}: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        println!("{failed} of {} downloads failed", outcomes.len());
    }
    Ok(())
}

fn report_progress(downloaded: u64, total: Option<u64>) {
    match total {
        Some(total) if total > 0 => {
            let percent = downloaded as f64 * 100.0 / total as f64;
            print!("\r  {} / {} KiB ({percent:.0}%)", downloaded / 1024, total / 1024);
        }
        _ => print!("\r  {} KiB", downloaded / 1024),
    }
    let _ = std::io::stdout().flush();
}
