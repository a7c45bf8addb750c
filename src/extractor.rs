// src/extractor.rs

use crate::model::{ChangeKind, ChangedFile, CommitInfo};
use crate::reader::OpenRepository;
use std::collections::BTreeSet;

/// Collects the basenames of files added or modified by the given commits.
///
/// Only the file name survives: `src/lib.rs` and `tests/lib.rs` collapse into a
/// single `lib.rs`. Deleted, renamed and other change kinds are ignored. A
/// commit whose diff cannot be read is logged and skipped.
pub fn extract<R: OpenRepository>(repo: &R, commits: &[CommitInfo]) -> BTreeSet<ChangedFile> {
    let mut changed = BTreeSet::new();

    for commit in commits {
        if commit.parent_ids.is_empty() {
            tracing::debug!("Commit {} is a root commit, every file counts as added", commit.id);
        }
        let entries = match repo.diff_tree(commit) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to diff commit {}: {}", commit.id, e);
                continue;
            }
        };

        let before = changed.len();
        changed.extend(
            entries
                .into_iter()
                .filter(|entry| matches!(entry.kind, ChangeKind::Added | ChangeKind::Modified))
                .filter_map(|entry| {
                    entry
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                }),
        );
        tracing::debug!("Commit {} added {} new file names", commit.id, changed.len() - before);
    }

    changed
}
