//! Configuration handling for refinfer.
//!
//! Configuration lives in `refinfer.toml`. Every field has a default, so an
//! absent file or an empty file yields [`Config::default`]. Command-line
//! flags override file values in the CLI layer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "refinfer.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// refinfer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Report format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON envelope (default)
    #[default]
    Json,
    /// One line per mapping and refactoring
    Text,
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

/// Inference settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceConfig {
    /// Mark inferred refactorings as found inside an extracted/inlined method
    #[serde(default)]
    pub inside_extracted_or_inlined_method: bool,

    /// Only explain mappings that are not exact
    #[serde(default = "default_skip_exact")]
    pub skip_exact_mappings: bool,
}

fn default_pretty() -> bool {
    true
}

fn default_skip_exact() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: default_pretty(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            inside_extracted_or_inlined_method: false,
            skip_exact_mappings: default_skip_exact(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load `refinfer.toml` from `dir`, or the defaults if there is none.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config");
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("", Path::new("refinfer.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.output.pretty);
        assert!(config.inference.skip_exact_mappings);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
[output]
format = "text"
pretty = false

[inference]
inside_extracted_or_inlined_method = true
"#;
        let config = Config::from_toml(text, Path::new("refinfer.toml")).unwrap();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.output.pretty);
        assert!(config.inference.inside_extracted_or_inlined_method);
        assert!(config.inference.skip_exact_mappings);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let err = Config::from_toml("[output\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn load_from_dir_without_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_dir_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[output]\nformat = \"text\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load(Path::new("/nonexistent/refinfer.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
