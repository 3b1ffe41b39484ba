//! CLI configuration
//!
//! Settings come from an optional `xnlogo.toml` in the working directory and
//! `XNLOGO_*` environment variables (a `.env` file is loaded first).
//! Command-line flags override both.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xnlogo_compiler::ContainerFormat;

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XnlogoConfig {
    /// Treat warnings as errors
    pub strict: bool,

    /// Container written by `build`
    pub format: ContainerFormat,

    /// Add `setup` and `go` buttons to generated models
    pub default_widgets: bool,

    /// Directory for build artifacts (defaults to the source file's directory)
    pub output_dir: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for XnlogoConfig {
    fn default() -> Self {
        Self {
            strict: false,
            format: ContainerFormat::default(),
            default_widgets: true,
            output_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl XnlogoConfig {
    /// Load configuration from `xnlogo.toml` and the environment
    pub fn load() -> Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("xnlogo").required(false))
            .add_source(config::Environment::with_prefix("XNLOGO").try_parsing(true));

        Self::deserialize_from(builder)
    }

    /// Load configuration from an explicit file, ignoring the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::deserialize_from(builder)
    }

    fn deserialize_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let cfg = builder.build().map_err(CliError::Config)?;
        cfg.try_deserialize().map_err(CliError::Config)
    }

    /// Directory a build artifact for `source` is written to
    pub fn output_dir_for(&self, source: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = XnlogoConfig::default();

        assert!(!config.strict);
        assert_eq!(config.format, ContainerFormat::Nlogox);
        assert!(config.default_widgets);
        assert!(config.output_dir.is_none());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_output_dir_defaults_to_source_directory() {
        let config = XnlogoConfig::default();
        assert_eq!(
            config.output_dir_for(Path::new("models/wolves.py")),
            PathBuf::from("models")
        );
        assert_eq!(config.output_dir_for(Path::new("wolves.py")), PathBuf::new());
    }

    #[test]
    fn test_output_dir_override() {
        let config = XnlogoConfig {
            output_dir: Some(PathBuf::from("out")),
            ..XnlogoConfig::default()
        };
        assert_eq!(
            config.output_dir_for(Path::new("models/wolves.py")),
            PathBuf::from("out")
        );
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: XnlogoConfig =
            serde_json::from_str(r#"{"format": "nlogo", "strict": true}"#).unwrap();

        assert!(config.strict);
        assert_eq!(config.format, ContainerFormat::Nlogo);
        assert!(config.default_widgets);
        assert_eq!(config.log_level, "warn");
    }
}
