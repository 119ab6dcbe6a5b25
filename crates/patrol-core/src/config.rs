//! Project configuration for patrol
//!
//! Read from `<project>/.patrol/config.yaml`. Every field is optional; a
//! missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths::Paths;

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Which tiers batch review runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewTiers {
    /// Core, then experimental, then legacy (same as live checks)
    #[default]
    All,
    /// Only the per-language legacy checkers
    LegacyOnly,
}

impl ReviewTiers {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::LegacyOnly => "legacy-only",
        }
    }
}

/// patrol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Hard timeout for every check process, in seconds
    pub check_timeout_secs: u64,

    /// Timeout for installed-tool version probes, in seconds
    pub probe_timeout_secs: u64,

    /// Tier set used by `review`
    pub review_tiers: ReviewTiers,

    /// Tools database override (JSON)
    pub registry: Option<PathBuf>,

    /// Send desktop notifications for failures in live mode
    pub desktop_notifications: bool,

    /// Tool names that are never run
    pub disabled_tools: Vec<String>,

    /// Maximum parsed issues kept per review result
    pub max_review_issues: usize,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            check_timeout_secs: 30,
            probe_timeout_secs: 5,
            review_tiers: ReviewTiers::All,
            registry: None,
            desktop_notifications: false,
            disabled_tools: Vec::new(),
            max_review_issues: 20,
        }
    }
}

impl PatrolConfig {
    /// Load config from a file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config for a project root
    pub fn load_for_project(project: &Path) -> Result<Self, ConfigError> {
        Self::load(&Paths::project_config(project))
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = PatrolConfig::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config, PatrolConfig::default());
        assert_eq!(config.check_timeout_secs, 30);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "review_tiers: legacy-only\ndisabled_tools:\n  - Prettier\n",
        )
        .unwrap();

        let config = PatrolConfig::load(&path).unwrap();
        assert_eq!(config.review_tiers, ReviewTiers::LegacyOnly);
        assert_eq!(config.disabled_tools, vec!["Prettier".to_string()]);
        assert_eq!(config.probe_timeout_secs, 5);
    }

    #[test]
    fn test_save_and_load_for_project() {
        let dir = tempdir().unwrap();
        let config = PatrolConfig {
            check_timeout_secs: 12,
            ..Default::default()
        };
        config.save(&Paths::project_config(dir.path())).unwrap();

        let loaded = PatrolConfig::load_for_project(dir.path()).unwrap();
        assert_eq!(loaded.check_timeout_secs, 12);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "check_timeout_secs: [not a number").unwrap();
        assert!(matches!(
            PatrolConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
