//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{GateError, Result};
use std::path::{Component, Path};
use tracing::debug;

/// Default config file name at the workspace root.
pub const CONFIG_FILE: &str = "gatekeep.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(GateError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            GateError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path` if it exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| GateError::UserError(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GateError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `backend_command` must parse with shell-words into at least one word
    /// - `artifacts_dir` and `run_root` must be non-empty relative paths
    ///   that stay inside the workspace
    pub fn validate(&self) -> Result<()> {
        let words = shell_words::split(&self.backend_command).map_err(|e| {
            GateError::UserError(format!(
                "config validation failed: backend_command '{}' is not a valid command: {}",
                self.backend_command, e
            ))
        })?;
        if words.is_empty() {
            return Err(GateError::UserError(
                "config validation failed: backend_command must not be empty".to_string(),
            ));
        }

        validate_dir("artifacts_dir", &self.artifacts_dir)?;
        validate_dir("run_root", &self.run_root)?;

        Ok(())
    }
}

fn validate_dir(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GateError::UserError(format!(
            "config validation failed: {} must not be empty",
            field
        )));
    }

    let path = Path::new(value);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(GateError::UserError(format!(
            "config validation failed: {} must be a relative path inside the workspace (found '{}')",
            field, value
        )));
    }

    Ok(())
}
