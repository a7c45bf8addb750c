// src/config.rs

use crate::cli::Args;
use crate::error::ConfigError;
use crate::model::SearchCriteria;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "git-harvest.json";

/// Settings as read from the JSON file. Everything is optional here;
/// required values are enforced by [`Config::into_settings`] after CLI overrides.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(alias = "ProjectsPath")]
    pub projects_path: Option<PathBuf>,
    #[serde(alias = "SearchedBranch")]
    pub branch_to_search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(alias = "AuthorEmail")]
    pub author_email: Option<String>,
    pub destination_output_path: Option<PathBuf>,
    #[serde(default)]
    pub path_overrides: Vec<PathOverride>,
    pub jobs: Option<usize>,
}

/// Replaces one enumerated project directory with another location
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOverride {
    /// Directory name under the projects path, or a full path
    pub match_path: PathBuf,
    /// Relative values are resolved against the projects path
    pub rewritten_path: PathBuf,
}

/// Validated run settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub criteria: SearchCriteria,
    pub destination: Option<PathBuf>,
    pub overrides: Vec<PathOverride>,
    pub jobs: usize,
}

impl Config {
    /// Load config from a JSON file. Keys may sit at the top level or under `SearcherInfo`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut value: serde_json::Value = serde_json::from_str(content)?;
        if let Some(section) = value.get_mut("SearcherInfo") {
            value = section.take();
        }
        serde_json::from_value(value)
    }

    /// Explicit `--config`, else the default file if present, else nothing
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    tracing::debug!("Using config file {}", default.display());
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Command-line values win over file values
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(v) = &args.projects_path {
            self.projects_path = Some(v.clone());
        }
        if let Some(v) = &args.branch {
            self.branch_to_search = Some(v.clone());
        }
        if let Some(v) = &args.date_from {
            self.date_from = Some(v.clone());
        }
        if let Some(v) = &args.date_to {
            self.date_to = Some(v.clone());
        }
        if let Some(v) = &args.author_email {
            self.author_email = Some(v.clone());
        }
        if let Some(v) = &args.output {
            self.destination_output_path = Some(v.clone());
        }
        if let Some(v) = args.jobs {
            self.jobs = Some(v);
        }
        self
    }

    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let root = self.projects_path.ok_or(ConfigError::Missing("projectsPath"))?;
        if root.as_os_str().is_empty() {
            return Err(ConfigError::Empty("projectsPath"));
        }
        let branch_name = required_text("branchToSearch", self.branch_to_search)?;
        let author_email = required_text("authorEmail", self.author_email)?;
        let date_from = parse_date("dateFrom", &required_text("dateFrom", self.date_from)?)?;
        let date_to = parse_date("dateTo", &required_text("dateTo", self.date_to)?)?;
        if date_from > date_to {
            tracing::warn!(
                "dateFrom {} is after dateTo {}, no commit can match",
                date_from,
                date_to
            );
        }

        let jobs = self.jobs.unwrap_or(1);
        if jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }

        Ok(Settings {
            root,
            criteria: SearchCriteria {
                branch_name,
                date_from,
                date_to,
                author_email,
            },
            destination: self
                .destination_output_path
                .filter(|p| !p.as_os_str().is_empty()),
            overrides: self.path_overrides,
            jobs,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(field));
    }
    Ok(trimmed.to_string())
}

/// Accepts a plain date or a timestamp; any time of day is dropped.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d.%m.%Y") {
        return Ok(date);
    }

    Err(ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
