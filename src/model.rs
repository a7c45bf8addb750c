// src/model.rs

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;

/// What to look for in every repository. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub branch_name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub author_email: String,
}

impl SearchCriteria {
    /// Author date is compared as a calendar day in the commit's own timezone,
    /// inclusive on both ends. Email comparison is exact.
    pub fn matches(&self, commit: &CommitInfo) -> bool {
        let day = commit.author_date.date_naive();
        day >= self.date_from && day <= self.date_to && commit.author_email == self.author_email
    }
}

/// A local branch as seen by a repository reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub is_checked_out: bool,
}

/// The parts of a commit the pipeline cares about
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: String,
    pub author_email: String,
    /// Carries the offset the author recorded, not the local one
    pub author_date: DateTime<FixedOffset>,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChange,
    Other,
}

/// One path touched by a commit relative to its first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// A changed file, identified by basename only
pub type ChangedFile = String;

/// Outcome of materializing one changed file from one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFileRecord {
    pub file_name: String,
    pub repository_path: PathBuf,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl ProcessedFileRecord {
    pub fn copied(file_name: &str, repository_path: PathBuf) -> Self {
        Self {
            file_name: file_name.to_string(),
            repository_path,
            succeeded: true,
            error_reason: None,
        }
    }

    pub fn failed(file_name: &str, repository_path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            repository_path,
            succeeded: false,
            error_reason: Some(reason.into()),
        }
    }
}

/// Why a candidate directory contributed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotARepository,
    OpenFailed(String),
    BranchMissing,
    ReadFailed(String),
    NoMatchingCommits,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotARepository => write!(f, "not a repository"),
            SkipReason::OpenFailed(e) => write!(f, "failed to open: {}", e),
            SkipReason::BranchMissing => write!(f, "branch not present"),
            SkipReason::ReadFailed(e) => write!(f, "failed to read history: {}", e),
            SkipReason::NoMatchingCommits => write!(f, "no matching commits"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySkip {
    pub repository_path: PathBuf,
    pub reason: SkipReason,
}

/// The run stopped because a repository had the target branch but was on another one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanAbort {
    pub repository_path: PathBuf,
    pub branch: String,
    /// Branch that HEAD points at, None when detached or unborn
    pub checked_out: Option<String>,
}

impl std::fmt::Display for ScanAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "branch '{}' is not checked out in {} (HEAD is {})",
            self.branch,
            self.repository_path.display(),
            self.checked_out.as_deref().unwrap_or("detached")
        )
    }
}
