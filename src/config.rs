//! Configuration file handling.
//!
//! This module provides loading and saving of upd8 configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/upd8/config.toml`
//! - macOS: `~/Library/Application Support/upd8/config.toml`
//! - Windows: `%APPDATA%\upd8\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! sources = ["npm", "pip3", "brew"]
//! command_timeout_secs = 60
//! interval_secs = 86400
//! show_packages = true
//! color = true
//! verbose = false
//! default_format = "table"
//!
//! [ignore]
//! packages = ["@types/*", "pip"]
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::SourceKind;
use crate::platform;

/// Application configuration.
///
/// Command-line flags override these values. Every field has a default, so
/// a partial file is valid.
///
/// # Example
///
/// ```no_run
/// use upd8::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Timeout: {:?}", config.command_timeout());
/// println!("Sources: {:?}", config.sources);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which sources to check, in report order.
    ///
    /// Default: all sources
    pub sources: Vec<SourceKind>,

    /// Deadline for a single external command, in seconds.
    ///
    /// Default: 60
    pub command_timeout_secs: u64,

    /// Rescan interval for `watch`, in seconds. Must be positive.
    ///
    /// Default: 86400 (24 hours)
    pub interval_secs: u64,

    /// Show a short preview of outdated package names.
    pub show_packages: bool,

    /// Colorize table output.
    ///
    /// Default: true
    pub color: bool,

    /// Include sources that reported nothing.
    pub verbose: bool,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Packages to leave out of reports.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Configuration for ignoring specific packages.
///
/// Useful for packages intentionally pinned to older versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to drop from every report.
    ///
    /// Supports glob patterns (e.g., "lodash*", "@types/*").
    pub packages: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a package should be ignored.
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }
}

/// Matches `text` against a pattern where `*` stands for any run of
/// characters. Everything else is literal.
fn glob_match(pattern: &str, text: &str) -> bool {
    let literal: Vec<String> = pattern.split('*').map(regex::escape).collect();
    Regex::new(&format!("^{}$", literal.join(".*")))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourceKind::all(),
            command_timeout_secs: 60,
            interval_secs: 24 * 60 * 60,
            show_packages: false,
            color: true,
            verbose: false,
            default_format: "table".to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use upd8::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("upd8/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        platform::config_dir().join("upd8").join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// The watch interval, rejected if zero.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::NonPositiveInterval);
        }
        Ok(Duration::from_secs(self.interval_secs))
    }
}
