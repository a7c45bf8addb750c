// src/testutil.rs

use chrono::DateTime;
use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::Path;

pub enum Change<'a> {
    Write(&'a str, &'a str),
    Delete(&'a str),
    Rename(&'a str, &'a str),
}

/// Fresh non-bare repository whose unborn HEAD points at `main`
pub fn init_repo(path: &Path) -> Repository {
    init_repo_on(path, "main")
}

pub fn init_repo_on(path: &Path, branch: &str) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    Repository::init_opts(path, &opts).unwrap()
}

/// Applies the changes to the work tree and index, then commits them on HEAD.
/// `when` is an RFC 3339 timestamp; its offset is stored as the author's timezone.
pub fn commit(repo: &Repository, email: &str, when: &str, changes: &[Change]) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();

    for change in changes {
        match change {
            Change::Write(rel, content) => {
                let path = workdir.join(rel);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(&path, content).unwrap();
                index.add_path(Path::new(rel)).unwrap();
            }
            Change::Delete(rel) => {
                fs::remove_file(workdir.join(rel)).unwrap();
                index.remove_path(Path::new(rel)).unwrap();
            }
            Change::Rename(from, to) => {
                let target = workdir.join(to);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::rename(workdir.join(from), &target).unwrap();
                index.remove_path(Path::new(from)).unwrap();
                index.add_path(Path::new(to)).unwrap();
            }
        }
    }
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let when = DateTime::parse_from_rfc3339(when).unwrap();
    let time = Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
    let sig = Signature::new("Dev", email, &time).unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parents)
        .unwrap()
}

/// Creates a branch at HEAD and points HEAD at it. The work tree is untouched.
pub fn checkout_new_branch(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch(name, &head, false).unwrap();
    repo.set_head(&format!("refs/heads/{}", name)).unwrap();
}
