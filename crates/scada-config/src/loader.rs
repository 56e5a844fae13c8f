//! Configuration loader with multi-source merging

use crate::{Paths, ScadaConfig};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable prefix (`SCADA_SIMULATION__RNG_SEED=7`).
const ENV_PREFIX: &str = "SCADA";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    user_config: bool,
    extra_file: Option<PathBuf>,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            user_config: true,
            extra_file: None,
            env_source: None,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Skip ~/.config/scada-sim/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Merge one more file above the local config. Unlike the discovered
    /// files, it must exist.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.extra_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<ScadaConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        let defaults = ScadaConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/scada-sim/config.toml)
        if self.user_config {
            if let Ok(user_config_file) = Paths::new().user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(
                        config::File::from(user_config_file)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // 3. Project config (scada.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (scada.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Explicit --config file
        if let Some(extra_file) = &self.extra_file {
            if !extra_file.exists() {
                anyhow::bail!("Config file not found: {}", extra_file.display());
            }
            builder = builder.add_source(
                config::File::from(extra_file.clone())
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        // 6. Environment variables (SCADA_SIMULATION__RNG_SEED=7)
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_source.clone()),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut scada_config: ScadaConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        scada_config.resolve_paths(&self.project_dir);
        scada_config
            .validate()
            .context("Merged configuration is invalid")?;

        Ok(scada_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> ScadaConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
