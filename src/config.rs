//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.deep-purple.toml` files.

use crate::api::ApiConfig;
use crate::cli::ReportFormat;
use crate::models::DEFAULT_TIMESTAMP_FORMAT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".deep-purple.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis service settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Dashboard rendering settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default dashboard output file. Empty means stdout.
    #[serde(default)]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default dashboard report format.
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: String::new(),
            verbose: false,
            format: ReportFormat::Markdown,
        }
    }
}

/// Analysis service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Access token from the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Dashboard rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// `chrono` format string for timeline timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Decimal places for average confidence.
    #[serde(default = "default_confidence_decimals")]
    pub confidence_decimals: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            confidence_decimals: default_confidence_decimals(),
        }
    }
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_confidence_decimals() -> usize {
    1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Try to load configuration from the current directory.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(ref token) = args.token {
            self.api.token = Some(token.clone());
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then `verbose` from the
    /// file or the command line.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Client settings derived from the `[api]` section.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api.base_url.clone(),
            timeout_seconds: self.api.timeout_seconds,
            token: self.api.token.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.dashboard.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.general.format, ReportFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "dashboard.md"
verbose = true
format = "json"

[api]
base_url = "https://purpleproj.click"
token = "abc"

[dashboard]
timestamp_format = "%d/%m/%Y"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "dashboard.md");
        assert!(config.general.verbose);
        assert_eq!(config.general.format, ReportFormat::Json);
        assert_eq!(config.api.base_url, "https://purpleproj.click");
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.dashboard.timestamp_format, "%d/%m/%Y");
        assert_eq!(config.dashboard.confidence_decimals, 1);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(!toml_str.contains("token"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.api.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[api]\nbase_url = \"http://example.test\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.api.base_url, "http://example.test");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[api\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::try_parse_from([
            "deep-purple",
            "--api-url",
            "http://override.test",
            "--timeout",
            "5",
            "models",
            "list",
        ])
        .unwrap();

        let mut config = Config::default();
        config.api.token = Some("from-file".to_string());
        config.merge_with_args(&args);

        let api = config.api_config();
        assert_eq!(api.base_url, "http://override.test");
        assert_eq!(api.timeout_seconds, 5);
        assert_eq!(api.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_log_level() {
        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        let args = Args::try_parse_from(["deep-purple", "--verbose", "models", "list"]).unwrap();
        config.merge_with_args(&args);
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);

        let file_config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(file_config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(file_config.log_level(true), tracing::Level::ERROR);
    }
}
