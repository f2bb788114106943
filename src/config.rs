//! Configuration loading
//!
//! Settings come from an optional YAML file in the workspace root.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hint definition file, relative to the workspace root
    pub hint_file: String,
    /// Files indexed as resources and diagnosed
    pub xml_glob: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub diagnostics: DiagnosticsSettings,
    pub completion: CompletionSettings,
}

/// Diagnostic worker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    pub enabled: bool,
    /// Quiet period after a file change before it is diagnosed
    pub file_debounce_ms: u64,
    /// Quiet period after a hint file change before the model is reloaded
    pub hint_debounce_ms: u64,
    /// Interval between full rescans
    pub rescan_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Maximum number of suggestions returned; unbounded when unset
    pub max_items: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hint_file: "Hacknet-EditorHint.xml".to_string(),
            xml_glob: "**/*.xml".to_string(),
            log_level: "info".to_string(),
            diagnostics: DiagnosticsSettings::default(),
            completion: CompletionSettings::default(),
        }
    }
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file_debounce_ms: 1000,
            hint_debounce_ms: 3000,
            rescan_interval_secs: 600,
        }
    }
}

impl DiagnosticsSettings {
    pub fn file_debounce(&self) -> Duration {
        Duration::from_millis(self.file_debounce_ms)
    }

    pub fn hint_debounce(&self) -> Duration {
        Duration::from_millis(self.hint_debounce_ms)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from the workspace root, falling back to defaults
    pub fn load_default(workspace_root: &Path) -> Self {
        let candidates = [
            workspace_root.join(".hacknet-hints.yaml"),
            workspace_root.join(".hacknet-hints.yml"),
            workspace_root.join("hacknet-hints.yaml"),
        ];

        for candidate in &candidates {
            if candidate.exists() {
                match Self::load(candidate) {
                    Ok(config) => return config,
                    Err(e) => warn!("{}, using defaults", e),
                }
            }
        }

        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hint_file, "Hacknet-EditorHint.xml");
        assert_eq!(config.diagnostics.file_debounce(), Duration::from_secs(1));
        assert_eq!(config.diagnostics.hint_debounce(), Duration::from_secs(3));
        assert_eq!(config.diagnostics.rescan_interval(), Duration::from_secs(600));
        assert!(config.completion.max_items.is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".hacknet-hints.yaml"),
            "hint_file: Hints/Main.xml\ndiagnostics:\n  file_debounce_ms: 250\ncompletion:\n  max_items: 20\n",
        )
        .unwrap();

        let config = Config::load_default(temp_dir.path());
        assert_eq!(config.hint_file, "Hints/Main.xml");
        assert_eq!(config.diagnostics.file_debounce_ms, 250);
        assert_eq!(config.diagnostics.hint_debounce_ms, 3000);
        assert_eq!(config.completion.max_items, Some(20));
    }

    #[test]
    fn test_invalid_yaml_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hacknet-hints.yaml");
        fs::write(&path, "diagnostics: [1, 2").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(Config::load_default(temp_dir.path()).hint_file, "Hacknet-EditorHint.xml");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
