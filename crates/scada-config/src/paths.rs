//! Path utilities and XDG directory discovery

use crate::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// File name of the git-tracked project config.
pub const PROJECT_CONFIG_FILE: &str = "scada.toml";

/// File name of the gitignored local override.
pub const LOCAL_CONFIG_FILE: &str = "scada.local.toml";

/// XDG-compliant paths for the simulator
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    /// Create a new Paths instance with XDG discovery
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("org", "ScadaSim", "scada-sim"),
        }
    }

    /// Get user config directory (~/.config/scada-sim/)
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or_else(|| {
                ConfigError::XdgError("Failed to determine user config directory".to_string())
            })
    }

    /// Get user config file path (~/.config/scada-sim/config.toml)
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    /// Get project config file path (scada.toml)
    pub fn project_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(PROJECT_CONFIG_FILE)
    }

    /// Get local config file path (scada.local.toml, gitignored)
    pub fn local_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(LOCAL_CONFIG_FILE)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
