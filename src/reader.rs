// src/reader.rs

use crate::error::ReaderError;
use crate::model::{BranchInfo, ChangeKind, CommitInfo, DiffEntry};
use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{
    BranchType, Delta, DiffFindOptions, DiffOptions, ErrorCode, Oid, Repository, Sort,
};
use std::path::Path;

/// Opens directories as repositories
pub trait RepositoryReader {
    type Repository: OpenRepository;

    /// Fails with [`ReaderError::NotARepository`] when `path` holds no repository
    fn open(&self, path: &Path) -> Result<Self::Repository, ReaderError>;
}

/// History access for one opened repository. Dropping the value releases it.
pub trait OpenRepository {
    fn branches(&self) -> Result<Vec<BranchInfo>, ReaderError>;

    /// Name of the branch HEAD points at, None when detached or unborn
    fn head_branch(&self) -> Option<String>;

    /// Every commit reachable from the branch tip, newest first
    fn commits(&self, branch: &str) -> Result<Vec<CommitInfo>, ReaderError>;

    /// Changes introduced by a commit relative to its first parent,
    /// or to the empty tree for a root commit
    fn diff_tree(&self, commit: &CommitInfo) -> Result<Vec<DiffEntry>, ReaderError>;
}

/// libgit2-backed reader
#[derive(Debug, Default, Clone, Copy)]
pub struct GitReader;

impl RepositoryReader for GitReader {
    type Repository = GitRepository;

    fn open(&self, path: &Path) -> Result<GitRepository, ReaderError> {
        // No discovery: a plain folder nested in some other work tree is not a repository
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => ReaderError::NotARepository(path.to_path_buf()),
            _ => ReaderError::Git(e),
        })?;
        tracing::debug!("Opened git repository at: {}", path.display());
        Ok(GitRepository { repo })
    }
}

pub struct GitRepository {
    repo: Repository,
}

impl OpenRepository for GitRepository {
    fn branches(&self) -> Result<Vec<BranchInfo>, ReaderError> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else {
                continue; // not valid utf-8
            };
            branches.push(BranchInfo {
                name: name.to_string(),
                is_checked_out: branch.is_head(),
            });
        }
        Ok(branches)
    }

    fn head_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(|s| s.to_string())
    }

    fn commits(&self, branch: &str) -> Result<Vec<CommitInfo>, ReaderError> {
        let reference = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| ReaderError::BranchNotFound(branch.to_string()))?;
        let tip = reference
            .get()
            .target()
            .ok_or_else(|| ReaderError::BranchNotFound(branch.to_string()))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let id = commit.id().to_string();
            let author = commit.author();
            let author_date =
                to_datetime(author.when()).ok_or_else(|| ReaderError::InvalidTime {
                    id: id.clone(),
                })?;

            commits.push(CommitInfo {
                author_email: author.email().unwrap_or("").to_string(),
                author_date,
                parent_ids: commit.parent_ids().map(|p| p.to_string()).collect(),
                id,
            });
        }

        tracing::debug!("Branch {} has {} commits", branch, commits.len());
        Ok(commits)
    }

    fn diff_tree(&self, commit: &CommitInfo) -> Result<Vec<DiffEntry>, ReaderError> {
        let oid = Oid::from_str(&commit.id)?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| ReaderError::CommitNotFound(commit.id.clone()))?;
        let current_tree = commit.tree()?;

        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.include_typechange(true);

        let mut diff = self.repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&current_tree),
            Some(&mut diff_opts),
        )?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let entries = diff
            .deltas()
            .filter_map(|delta| {
                let path = delta.new_file().path().or_else(|| delta.old_file().path())?;
                Some(DiffEntry {
                    path: path.to_path_buf(),
                    kind: change_kind(delta.status()),
                })
            })
            .collect();

        Ok(entries)
    }
}

fn change_kind(delta: Delta) -> ChangeKind {
    match delta {
        Delta::Added => ChangeKind::Added,
        Delta::Modified => ChangeKind::Modified,
        Delta::Deleted => ChangeKind::Deleted,
        Delta::Renamed => ChangeKind::Renamed,
        Delta::Copied => ChangeKind::Copied,
        Delta::Typechange => ChangeKind::TypeChange,
        _ => ChangeKind::Other,
    }
}

fn to_datetime(time: git2::Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    offset.timestamp_opt(time.seconds(), 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{checkout_new_branch, commit, init_repo, Change};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GitReader.open(dir.path()),
            Err(ReaderError::NotARepository(path)) if path == dir.path()
        ));
    }

    #[test]
    fn reports_checked_out_branch() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        commit(
            &repo,
            "dev@example.com",
            "2024-03-01T10:00:00+00:00",
            &[Change::Write("a.txt", "a")],
        );
        checkout_new_branch(&repo, "feature");

        let opened = GitReader.open(dir.path()).unwrap();
        let mut branches = opened.branches().unwrap();
        branches.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            branches,
            vec![
                BranchInfo { name: "feature".into(), is_checked_out: true },
                BranchInfo { name: "main".into(), is_checked_out: false },
            ]
        );
        assert_eq!(opened.head_branch().as_deref(), Some("feature"));
    }

    #[test]
    fn commit_dates_keep_author_offset() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        // 23:30 at +02:00 is still the 1st locally, the 1st at 21:30 UTC
        commit(
            &repo,
            "dev@example.com",
            "2024-03-01T23:30:00+02:00",
            &[Change::Write("a.txt", "a")],
        );
        // 00:30 at +02:00 is the 2nd locally but still the 1st in UTC
        commit(
            &repo,
            "dev@example.com",
            "2024-03-02T00:30:00+02:00",
            &[Change::Write("a.txt", "b")],
        );

        let opened = GitReader.open(dir.path()).unwrap();
        let commits = opened.commits("main").unwrap();
        let days: Vec<NaiveDate> = commits.iter().map(|c| c.author_date.date_naive()).collect();

        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
        assert_eq!(commits[0].parent_ids, vec![commits[1].id.clone()]);
        assert!(commits[1].parent_ids.is_empty());
    }

    #[test]
    fn missing_branch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        commit(
            &repo,
            "dev@example.com",
            "2024-03-01T10:00:00+00:00",
            &[Change::Write("a.txt", "a")],
        );

        let opened = GitReader.open(dir.path()).unwrap();
        assert!(matches!(opened.commits("release"), Err(ReaderError::BranchNotFound(_))));
    }

    #[test]
    fn diff_classifies_changes_against_first_parent() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        commit(
            &repo,
            "dev@example.com",
            "2024-03-01T10:00:00+00:00",
            &[
                Change::Write("keep.txt", "one\n"),
                Change::Write("gone.txt", "bye\n"),
                Change::Write(
                    "old_name.txt",
                    "a fairly long line so rename detection has content\n",
                ),
            ],
        );
        commit(
            &repo,
            "dev@example.com",
            "2024-03-02T10:00:00+00:00",
            &[
                Change::Write("keep.txt", "two\n"),
                Change::Write("src/new.rs", "fn main() {}\n"),
                Change::Delete("gone.txt"),
                Change::Rename("old_name.txt", "new_name.txt"),
            ],
        );

        let opened = GitReader.open(dir.path()).unwrap();
        let commits = opened.commits("main").unwrap();
        let mut entries = opened.diff_tree(&commits[0]).unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let kinds: Vec<(String, ChangeKind)> = entries
            .iter()
            .map(|e| (e.path.to_string_lossy().into_owned(), e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("gone.txt".to_string(), ChangeKind::Deleted),
                ("keep.txt".to_string(), ChangeKind::Modified),
                ("new_name.txt".to_string(), ChangeKind::Renamed),
                ("src/new.rs".to_string(), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn root_commit_diffs_against_empty_tree() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        commit(
            &repo,
            "dev@example.com",
            "2024-03-01T10:00:00+00:00",
            &[Change::Write("a.txt", "a"), Change::Write("docs/b.md", "b")],
        );

        let opened = GitReader.open(dir.path()).unwrap();
        let commits = opened.commits("main").unwrap();
        let entries = opened.diff_tree(&commits[0]).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == ChangeKind::Added));
    }
}
