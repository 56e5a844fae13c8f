//! Configuration management for the SCADA attack simulator
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (SCADA_* prefix, `__` between nested keys)
//! 3. scada.local.toml (gitignored, local overrides)
//! 4. scada.toml (git-tracked, project config)
//! 5. ~/.config/scada-sim/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE, Paths};
pub use scada_sim::SimConfig;

/// Top-level simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScadaConfig {
    pub simulation: SimConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Where to write the JSONL event trace, if anywhere.
    pub trace_file: Option<PathBuf>,
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            trace_file: None,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable narration.
    #[default]
    Text,
    /// One JSON object per event plus a summary object.
    Json,
}

impl ScadaConfig {
    /// Reads a single TOML file, without any layering.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }
        Ok(config)
    }

    /// Rejects simulation parameters the engine would refuse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if let Some(trace_file) = &self.output.trace_file {
            if trace_file.is_relative() {
                self.output.trace_file = Some(base.join(trace_file));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ScadaConfig::default();
        assert_eq!(config.simulation, SimConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.output.color);
        assert!(config.output.trace_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_path_resolution() {
        let mut config = ScadaConfig::default();
        config.output.trace_file = Some(PathBuf::from("traces/run.jsonl"));
        config.resolve_paths("/home/user/plant");

        assert_eq!(
            config.output.trace_file,
            Some(PathBuf::from("/home/user/plant/traces/run.jsonl"))
        );
    }

    #[test]
    fn test_absolute_trace_file_untouched() {
        let mut config = ScadaConfig::default();
        config.output.trace_file = Some(PathBuf::from("/var/log/run.jsonl"));
        config.resolve_paths("/home/user/plant");

        assert_eq!(
            config.output.trace_file,
            Some(PathBuf::from("/var/log/run.jsonl"))
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ScadaConfig::default();
        config.simulation.rng_seed = 99;
        config.output.format = OutputFormat::Json;

        let rendered = config.to_toml_string().expect("Failed to render");
        assert!(rendered.contains("[simulation]"));
        assert!(rendered.contains("format = \"json\""));

        let parsed: ScadaConfig = toml::from_str(&rendered).expect("Failed to parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_toml_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[simulation]
burst_limit = 2000.0
spoof_sensor = false

[output]
trace_file = "out.jsonl"
"#,
        )
        .expect("Failed to write config");

        let config = ScadaConfig::from_toml_file(&path).expect("Failed to load");
        assert_eq!(config.simulation.burst_limit, 2000.0);
        assert!(!config.simulation.spoof_sensor);
        assert_eq!(config.simulation.safety_threshold, 1000.0);
        assert_eq!(
            config.output.trace_file,
            Some(temp_dir.path().join("out.jsonl"))
        );
    }

    #[test]
    fn test_from_toml_file_errors() {
        let temp_dir = tempdir().expect("Failed to create temp dir");

        let missing = ScadaConfig::from_toml_file(temp_dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::ReadError { .. })));

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "[simulation\nburst_limit = ").expect("Failed to write config");
        assert!(matches!(
            ScadaConfig::from_toml_file(&broken),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_simulation_fails_validation() {
        let mut config = ScadaConfig::default();
        config.simulation.burst_limit = 100.0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("burst_limit"));
    }
}
