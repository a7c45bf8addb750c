// src/materializer.rs

use crate::model::{ChangedFile, ProcessedFileRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const NOT_FOUND: &str = "not found in repository";
pub const ALREADY_EXISTS: &str = "already exists at destination";

/// Basename -> repository-relative path for every regular file in a work tree.
/// When several files share a name the lexicographically smallest path wins.
#[derive(Debug)]
pub struct WorkingTreeIndex {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl WorkingTreeIndex {
    /// Single walk of `root`, skipping `.git` and anything under `exclude`
    pub fn build(root: &Path, exclude: &Path) -> Self {
        let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir() && (e.file_name() == ".git" || e.path() == exclude))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            // Symlinks count when they resolve to a regular file
            let file_type = entry.file_type();
            if !(file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            files
                .entry(name)
                .and_modify(|current| {
                    if relative < current.as_path() {
                        *current = relative.to_path_buf();
                    }
                })
                .or_insert_with(|| relative.to_path_buf());
        }

        tracing::debug!("Indexed {} file names in {}", files.len(), root.display());
        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.files.get(name).map(|relative| self.root.join(relative))
    }
}

/// Copies changed files out of work trees into one flat directory
#[derive(Debug, Clone)]
pub struct FileMaterializer {
    output_dir: PathBuf,
}

impl FileMaterializer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// One record per name, in the iteration order of `changed`. Never fails as a whole.
    pub fn materialize(
        &self,
        repository_path: &Path,
        changed: &BTreeSet<ChangedFile>,
    ) -> Vec<ProcessedFileRecord> {
        let index = WorkingTreeIndex::build(repository_path, &self.output_dir);

        changed
            .iter()
            .map(|name| self.materialize_one(repository_path, &index, name))
            .collect()
    }

    fn materialize_one(
        &self,
        repository_path: &Path,
        index: &WorkingTreeIndex,
        name: &str,
    ) -> ProcessedFileRecord {
        let repo = repository_path.to_path_buf();

        let Some(source) = index.lookup(name) else {
            tracing::warn!("{} not found in {}", name, repository_path.display());
            return ProcessedFileRecord::failed(name, repo, NOT_FOUND);
        };

        let destination = self.output_dir.join(name);
        match copy_new(&source, &destination) {
            Ok(bytes) => {
                tracing::debug!(
                    "Copied {} ({} bytes) to {}",
                    source.display(),
                    bytes,
                    destination.display()
                );
                ProcessedFileRecord::copied(name, repo)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(
                    "{} already exists in {}, not copied from {}",
                    name,
                    self.output_dir.display(),
                    repository_path.display()
                );
                ProcessedFileRecord::failed(name, repo, ALREADY_EXISTS)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    e
                );
                ProcessedFileRecord::failed(name, repo, e.to_string())
            }
        }
    }
}

/// Create-only copy. The existence check and the creation are one atomic open,
/// so concurrent writers can never both create the same destination.
fn copy_new(source: &Path, destination: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(destination)?;

    let copied = match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination) {
                tracing::warn!(
                    "Failed to remove partial copy {}: {}",
                    destination.display(),
                    cleanup
                );
            }
            return Err(e);
        }
    };

    if let Ok(meta) = reader.metadata() {
        if let Err(e) = writer.set_permissions(meta.permissions()) {
            tracing::debug!("Could not copy permissions to {}: {}", destination.display(), e);
        }
    }
    Ok(copied)
}
