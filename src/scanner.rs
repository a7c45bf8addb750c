// src/scanner.rs

use crate::config::PathOverride;
use crate::error::{ConfigError, ReaderError};
use crate::extractor;
use crate::materializer::FileMaterializer;
use crate::model::{
    ChangedFile, ProcessedFileRecord, RepositorySkip, ScanAbort, SearchCriteria, SkipReason,
};
use crate::reader::{OpenRepository, RepositoryReader};
use crate::report::RunReport;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Changed files of one repository, ready to be copied
#[derive(Debug)]
struct RepositoryPlan {
    path: PathBuf,
    changed: BTreeSet<ChangedFile>,
}

enum Step {
    Skip(SkipReason),
    Abort(ScanAbort),
    Ready(RepositoryPlan),
}

/// Drives extraction and materialization over every project directory under a root
pub struct RepositoryScanner<R: RepositoryReader> {
    reader: R,
    criteria: SearchCriteria,
    materializer: FileMaterializer,
    overrides: Vec<PathOverride>,
    jobs: usize,
    progress: bool,
}

impl<R: RepositoryReader> RepositoryScanner<R> {
    pub fn new(reader: R, criteria: SearchCriteria, materializer: FileMaterializer) -> Self {
        Self {
            reader,
            criteria,
            materializer,
            overrides: Vec::new(),
            jobs: 1,
            progress: false,
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<PathOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Scans every candidate in order. Returns an error only for problems found
    /// before the first repository is opened; everything later lands in the report.
    pub fn scan(&self, root: &Path) -> Result<RunReport, ConfigError> {
        let candidates =
            enumerate_candidates(root, self.materializer.output_dir(), &self.overrides)?;
        tracing::info!("Found {} projects to search in {}", candidates.len(), root.display());

        let mut report = RunReport::new();
        let mut planned = Vec::new();

        let bar = self.progress_bar(candidates.len());
        bar.set_message("Scanning repositories");

        for path in candidates {
            match self.plan_repository(&path) {
                Step::Skip(reason) => {
                    match reason {
                        SkipReason::NotARepository | SkipReason::BranchMissing => {
                            tracing::info!("Skipping {}: {}", path.display(), reason)
                        }
                        _ => tracing::warn!("Skipping {}: {}", path.display(), reason),
                    }
                    report.skip(RepositorySkip {
                        repository_path: path,
                        reason,
                    });
                }
                Step::Abort(abort) => {
                    tracing::error!(
                        "{}; check out '{}' before searching. Stopping.",
                        abort,
                        abort.branch
                    );
                    report.abort(abort);
                    break;
                }
                Step::Ready(plan) if self.jobs > 1 => planned.push(plan),
                Step::Ready(plan) => report.accumulate(materialize_plan(&self.materializer, &plan)),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if !planned.is_empty() {
            for records in self.materialize_parallel(&planned) {
                report.accumulate(records);
            }
        }

        Ok(report)
    }

    /// All git work for one repository. The handle is dropped on return.
    fn plan_repository(&self, path: &Path) -> Step {
        let repo = match self.reader.open(path) {
            Ok(repo) => repo,
            Err(ReaderError::NotARepository(_)) => {
                return Step::Skip(SkipReason::NotARepository)
            }
            Err(e) => return Step::Skip(SkipReason::OpenFailed(e.to_string())),
        };
        tracing::debug!("Configure project repo: {}", path.display());

        let branches = match repo.branches() {
            Ok(branches) => branches,
            Err(e) => return Step::Skip(SkipReason::ReadFailed(e.to_string())),
        };
        let Some(branch) = branches.iter().find(|b| b.name == self.criteria.branch_name) else {
            return Step::Skip(SkipReason::BranchMissing);
        };
        if !branch.is_checked_out {
            return Step::Abort(ScanAbort {
                repository_path: path.to_path_buf(),
                branch: branch.name.clone(),
                checked_out: repo.head_branch(),
            });
        }

        tracing::info!("Search for project repo: {} in progress...", path.display());
        let commits = match repo.commits(&branch.name) {
            Ok(commits) => commits,
            Err(e) => return Step::Skip(SkipReason::ReadFailed(e.to_string())),
        };
        let total = commits.len();
        let matching: Vec<_> = commits.into_iter().filter(|c| self.criteria.matches(c)).collect();
        tracing::debug!("{} of {} commits match in {}", matching.len(), total, path.display());

        if matching.is_empty() {
            return Step::Skip(SkipReason::NoMatchingCommits);
        }

        Step::Ready(RepositoryPlan {
            path: path.to_path_buf(),
            changed: extractor::extract(&repo, &matching),
        })
    }

    fn materialize_parallel(&self, plans: &[RepositoryPlan]) -> Vec<Vec<ProcessedFileRecord>> {
        let materializer = &self.materializer;
        let bar = self.progress_bar(plans.len());
        bar.set_message("Copying files");

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("Falling back to sequential copy: {}", e);
                return plans.iter().map(|plan| materialize_plan(materializer, plan)).collect();
            }
        };

        let results: Vec<Vec<ProcessedFileRecord>> = pool.install(|| {
            plans
                .par_iter()
                .progress_with(bar.clone())
                .map(|plan| materialize_plan(materializer, plan))
                .collect()
        });
        bar.finish_and_clear();
        results
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if self.progress {
            ProgressBar::new(len as u64)
        } else {
            ProgressBar::hidden()
        }
    }
}

fn materialize_plan(
    materializer: &FileMaterializer,
    plan: &RepositoryPlan,
) -> Vec<ProcessedFileRecord> {
    let records = materializer.materialize(&plan.path, &plan.changed);

    let copied = records.iter().filter(|r| r.succeeded).count();
    tracing::info!("Copied {} files for project repo: {}", copied, plan.path.display());
    if copied < records.len() {
        tracing::warn!(
            "Some files not processed for project repo: {}, not processed files: {}",
            plan.path.display(),
            records.len() - copied
        );
    }
    records
}

/// Immediate subdirectories of `root` in name order, without `output_dir`,
/// with path overrides applied.
pub fn enumerate_candidates(
    root: &Path,
    output_dir: &Path,
    overrides: &[PathOverride],
) -> Result<Vec<PathBuf>, ConfigError> {
    if !root.is_dir() {
        return Err(ConfigError::RootMissing(root.to_path_buf()));
    }
    let list_err = |source: std::io::Error| ConfigError::ListRoot {
        path: root.to_path_buf(),
        source,
    };
    let root = root.canonicalize().map_err(list_err)?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(&root).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if !path.is_dir() {
            continue;
        }
        if path == output_dir || path.canonicalize().is_ok_and(|p| p == output_dir) {
            continue;
        }
        dirs.push(path);
    }
    dirs.sort();

    if dirs.is_empty() {
        return Err(ConfigError::NoCandidates(root));
    }

    Ok(dirs
        .into_iter()
        .map(|dir| apply_overrides(&root, dir, overrides))
        .collect())
}

fn apply_overrides(root: &Path, dir: PathBuf, overrides: &[PathOverride]) -> PathBuf {
    let name = dir.file_name().map(Path::new);
    let hit = overrides
        .iter()
        .find(|o| o.match_path == dir || Some(o.match_path.as_path()) == name);

    match hit {
        Some(o) => {
            let rewritten = root.join(&o.rewritten_path);
            tracing::info!("Using {} in place of {}", rewritten.display(), dir.display());
            rewritten
        }
        None => dir,
    }
}
