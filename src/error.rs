// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before any repository is touched
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing required setting '{0}'")]
    Missing(&'static str),

    #[error("Setting '{0}' must not be empty")]
    Empty(&'static str),

    #[error("Invalid date '{value}' for '{field}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("jobs must be at least 1")]
    ZeroJobs,

    #[error("Projects path '{0}' does not exist")]
    RootMissing(PathBuf),

    #[error("Projects path '{0}' contains no directories to scan")]
    NoCandidates(PathBuf),

    #[error("Destination '{0}' does not exist")]
    DestinationMissing(PathBuf),

    #[error("Destination '{0}' is not a directory")]
    DestinationNotDirectory(PathBuf),

    #[error("Destination '{0}' is not empty")]
    DestinationNotEmpty(PathBuf),

    #[error("Failed to prepare destination '{path}': {source}")]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list '{path}': {source}")]
    ListRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures reported by a repository reader
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("'{0}' is not a git repository")]
    NotARepository(PathBuf),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Branch '{0}' not found")]
    BranchNotFound(String),

    #[error("Commit '{0}' not found")]
    CommitNotFound(String),

    #[error("Commit {id} has an invalid timestamp")]
    InvalidTime { id: String },
}
