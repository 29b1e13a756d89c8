use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use termdates::fetch::fetch_pdf;
use termdates::{AcademicYear, Config, ExtractError, RunSummary, ScheduleDocument, extract_pdf};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(about = "Extract schooldays and holidays from shaded term-date PDF calendars.")]
struct Args {
    /// TOML file listing sources and override dates.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON path. Defaults to schooldays.json.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory holding downloaded PDFs.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

fn main() -> Result<(), ExtractError> {
    termdates::logging::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    if args.cache_dir.is_some() {
        config.cache_dir = args.cache_dir.clone();
    }

    let mut years = Vec::new();
    for source in &config.sources {
        match extract_year(&config, &source.academic_year, &source.url) {
            Ok(result) => years.push(result),
            Err(err) => error!(academic_year = %source.academic_year, %err, "skipping academic year"),
        }
    }

    let last_updated = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let document = ScheduleDocument::new(last_updated, years);
    let output = config.output_path();
    document.write(&output)?;

    let summary = RunSummary::from_years(&document.academic_years);
    println!("Wrote {}", output.display());
    println!("  Academic years:     {}", document.academic_years.len());
    println!("  Teaching days:      {}", summary.teaching_days);
    println!("  Holidays:           {}", summary.holidays);
    println!("  Exam results days:  {}", summary.exam_results_days);
    println!("  Weekdays:           {}", summary.weekdays);
    println!("  Weekends:           {}", summary.weekends);
    println!("  Total days:         {}", summary.total_days());
    Ok(())
}

fn extract_year(
    config: &Config,
    academic_year: &str,
    url: &str,
) -> Result<termdates::AcademicYearResult, ExtractError> {
    let year = AcademicYear::parse(academic_year)?;
    let pdf = fetch_pdf(url, config.cache_dir(), academic_year)?;
    let overrides = config.overrides_for(academic_year);
    for note in config.override_notes(academic_year) {
        info!(academic_year, overrides = overrides.len(), note, "using override dates");
    }
    let extraction = extract_pdf(&pdf, year, overrides)?;
    Ok(extraction.result)
}
