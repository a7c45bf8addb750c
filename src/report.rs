// src/report.rs

use crate::model::{ProcessedFileRecord, RepositorySkip, ScanAbort};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Run-wide accumulation of per-file outcomes, repository skips and the abort
/// condition. Everything is kept in insertion order.
#[derive(Debug, Default)]
pub struct RunReport {
    records: Vec<ProcessedFileRecord>,
    skipped: Vec<RepositorySkip>,
    aborted: Option<ScanAbort>,
    repositories_processed: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records from one repository
    pub fn accumulate(&mut self, records: Vec<ProcessedFileRecord>) {
        self.repositories_processed += 1;
        self.records.extend(records);
    }

    pub fn skip(&mut self, skip: RepositorySkip) {
        self.skipped.push(skip);
    }

    pub fn abort(&mut self, abort: ScanAbort) {
        self.aborted = Some(abort);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn records(&self) -> &[ProcessedFileRecord] {
        &self.records
    }

    pub fn summary(&self) -> RunSummary {
        let failures: Vec<FailureEntry> = self
            .records
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| FailureEntry {
                file_name: r.file_name.clone(),
                repository_path: r.repository_path.clone(),
                reason: r.error_reason.clone().unwrap_or_default(),
            })
            .collect();

        RunSummary {
            copied_count: self.records.len() - failures.len(),
            failed_count: failures.len(),
            repositories_processed: self.repositories_processed,
            failures,
            skipped: self.skipped.clone(),
            aborted: self.aborted.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub file_name: String,
    pub repository_path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub copied_count: usize,
    pub failed_count: usize,
    pub repositories_processed: usize,
    pub failures: Vec<FailureEntry>,
    pub skipped: Vec<RepositorySkip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<ScanAbort>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Copied {} file(s), {} not processed, from {} repositories.",
            self.copied_count, self.failed_count, self.repositories_processed
        )?;

        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(
                    f,
                    "  {} ({}): {}",
                    failure.file_name,
                    failure.repository_path.display(),
                    failure.reason
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "Skipped repositories:")?;
            for skip in &self.skipped {
                writeln!(f, "  {}: {}", skip.repository_path.display(), skip.reason)?;
            }
        }

        if let Some(abort) = &self.aborted {
            writeln!(f, "Aborted: {}", abort)?;
        }
        Ok(())
    }
}
