// src/main.rs

mod cli;
mod config;
mod error;
mod extractor;
mod materializer;
mod model;
mod output_path;
mod reader;
mod report;
mod scanner;
#[cfg(test)]
mod testutil;

use chrono::Local;
use clap::Parser;
use cli::Args;
use config::{Config, Settings};
use error::ConfigError;
use materializer::FileMaterializer;
use reader::GitReader;
use report::RunReport;
use scanner::RepositoryScanner;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_CLEAN: u8 = 0;
const EXIT_FILE_FAILURES: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_ABORTED: u8 = 3;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);
    let start_time = Instant::now();

    let settings = match Config::discover(args.config.as_deref())
        .map(|config| config.merge_args(&args))
        .and_then(Config::into_settings)
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let report = match run(&settings, !args.quiet) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let summary = report.summary();
    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: failed to serialize summary: {}", e),
        }
    } else {
        print!("{}", summary);
    }

    tracing::info!(
        "Finished search and copy in {:.2?}: {} copied, {} not processed",
        start_time.elapsed(),
        summary.copied_count,
        summary.failed_count
    );

    ExitCode::from(exit_code(&report))
}

fn init_tracing(args: &Args) {
    let default = if args.verbose {
        "git_harvest=debug"
    } else if args.quiet {
        "git_harvest=warn"
    } else {
        "git_harvest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Validates the root and destination, then scans. Errors mean nothing was scanned.
fn run(settings: &Settings, progress: bool) -> Result<RunReport, ConfigError> {
    let today = Local::now().date_naive();
    tracing::info!(
        "Start for configuration: projects path {}, branch {}, author {}, {} to {}",
        settings.root.display(),
        settings.criteria.branch_name,
        settings.criteria.author_email,
        settings.criteria.date_from,
        settings.criteria.date_to
    );

    // Enumerate once up front so a bad root never leaves a fresh output directory behind
    let planned = settings
        .destination
        .clone()
        .unwrap_or_else(|| output_path::default_output_dir(&settings.root, today));
    let planned = planned.canonicalize().unwrap_or(planned);
    scanner::enumerate_candidates(&settings.root, &planned, &settings.overrides)?;

    let output_dir = output_path::resolve(&settings.root, settings.destination.as_deref(), today)?;
    tracing::info!("Copying changed files into {}", output_dir.display());

    RepositoryScanner::new(
        GitReader,
        settings.criteria.clone(),
        FileMaterializer::new(output_dir),
    )
    .with_overrides(settings.overrides.clone())
    .with_jobs(settings.jobs)
    .with_progress(progress)
    .scan(&settings.root)
}

fn exit_code(report: &RunReport) -> u8 {
    if report.is_aborted() {
        EXIT_ABORTED
    } else if report.records().iter().any(|r| !r.succeeded) {
        EXIT_FILE_FAILURES
    } else {
        EXIT_CLEAN
    }
}
