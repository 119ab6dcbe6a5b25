//! Standard paths used by patrol

use std::path::{Path, PathBuf};

/// Name of the per-project directory holding patrol files
pub const PROJECT_DIR: &str = ".patrol";

/// Standard patrol paths
pub struct Paths {
    /// Data directory (~/.local/share/patrol)
    pub data: PathBuf,
    /// Config directory (~/.config/patrol)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("patrol");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("patrol");

        Self { data, config }
    }

    /// User-wide tools database override (~/.config/patrol/tools.json)
    pub fn user_registry(&self) -> PathBuf {
        self.config.join("tools.json")
    }

    /// Report written by the most recent `patrol review`
    pub fn last_review(&self) -> PathBuf {
        self.data.join("last_review.json")
    }

    /// Project configuration file (<project>/.patrol/config.yaml)
    pub fn project_config(project: &Path) -> PathBuf {
        project.join(PROJECT_DIR).join("config.yaml")
    }
}
