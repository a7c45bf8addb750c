// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file (defaults to ./git-harvest.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory whose immediate subdirectories are scanned as repositories
    #[arg(short, long)]
    pub projects_path: Option<PathBuf>,

    /// Branch that must be checked out in every scanned repository
    #[arg(short, long)]
    pub branch: Option<String>,

    /// First day of the search window (inclusive)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Last day of the search window (inclusive)
    #[arg(long)]
    pub date_to: Option<String>,

    /// Author email to match, compared exactly
    #[arg(short, long)]
    pub author_email: Option<String>,

    /// Existing, empty directory to copy files into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads used to copy files
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors, hide the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
