// src/output_path.rs

use crate::error::ConfigError;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_DIR_PREFIX: &str = "ChangedFilesFromRepository_";

/// `<root>/ChangedFilesFromRepository_<yyyyMMdd>`
pub fn default_output_dir(root: &Path, today: NaiveDate) -> PathBuf {
    root.join(format!("{}{}", DEFAULT_DIR_PREFIX, today.format("%Y%m%d")))
}

/// Picks the destination directory and makes sure it is usable.
///
/// An explicit path must already exist and hold no files. The generated default
/// is created on demand but is held to the same emptiness rule when it exists.
/// The returned path is canonical so it can be compared against enumerated
/// repository directories.
pub fn resolve(
    root: &Path,
    explicit: Option<&Path>,
    today: NaiveDate,
) -> Result<PathBuf, ConfigError> {
    let dir = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::DestinationMissing(path.to_path_buf()));
            }
            path.to_path_buf()
        }
        None => {
            let path = default_output_dir(root, today);
            if !path.exists() {
                fs::create_dir_all(&path).map_err(|source| ConfigError::Destination {
                    path: path.clone(),
                    source,
                })?;
                tracing::info!("Created output directory {}", path.display());
            }
            path
        }
    };

    if !dir.is_dir() {
        return Err(ConfigError::DestinationNotDirectory(dir));
    }
    if contains_files(&dir) {
        return Err(ConfigError::DestinationNotEmpty(dir));
    }

    dir.canonicalize()
        .map_err(|source| ConfigError::Destination { path: dir, source })
}

/// Empty subdirectories do not count. Unreadable entries count as content.
fn contains_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .any(|entry| entry.map_or(true, |e| !e.file_type().is_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn default_name_uses_compact_date() {
        let root = Path::new("/projects");
        assert_eq!(
            default_output_dir(root, day()),
            PathBuf::from("/projects/ChangedFilesFromRepository_20240309")
        );
    }

    #[test]
    fn creates_default_when_absent() {
        let root = TempDir::new().unwrap();
        let resolved = resolve(root.path(), None, day()).unwrap();

        assert!(resolved.is_dir());
        assert_eq!(
            resolved,
            root.path()
                .canonicalize()
                .unwrap()
                .join("ChangedFilesFromRepository_20240309")
        );
    }

    #[test]
    fn existing_empty_default_is_reused() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(default_output_dir(root.path(), day()).join("empty/sub")).unwrap();

        assert!(resolve(root.path(), None, day()).is_ok());
    }

    #[test]
    fn non_empty_default_is_rejected() {
        let root = TempDir::new().unwrap();
        let dir = default_output_dir(root.path(), day());
        fs::create_dir_all(dir.join("deep")).unwrap();
        fs::write(dir.join("deep/old.txt"), "x").unwrap();

        assert!(matches!(
            resolve(root.path(), None, day()),
            Err(ConfigError::DestinationNotEmpty(_))
        ));
    }

    #[test]
    fn explicit_must_exist() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");

        assert!(matches!(
            resolve(root.path(), Some(&missing), day()),
            Err(ConfigError::DestinationMissing(_))
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn explicit_must_be_empty() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("leftover.txt"), "x").unwrap();

        assert!(matches!(
            resolve(root.path(), Some(out.path()), day()),
            Err(ConfigError::DestinationNotEmpty(_))
        ));
    }

    #[test]
    fn explicit_file_is_rejected() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            resolve(root.path(), Some(&file), day()),
            Err(ConfigError::DestinationNotDirectory(_))
        ));
    }

    #[test]
    fn explicit_empty_dir_is_used() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let resolved = resolve(root.path(), Some(out.path()), day()).unwrap();
        assert_eq!(resolved, out.path().canonicalize().unwrap());
        assert!(!default_output_dir(root.path(), day()).exists());
    }
}
