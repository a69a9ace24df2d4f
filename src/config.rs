//! Configuration management
//!
//! Handles TOML configuration parsing and validation. Every section is
//! optional; command-line flags override whatever the file sets.

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{APP_NAME, CONFIG_FILE_NAME};
use crate::flatten::FlattenOptions;
use crate::input::SourcePaths;
use crate::merge::MergeOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfiguration {
    pub merge: MergeSettings,
    pub flatten: FlattenSettings,
    pub logging: LoggingSettings,
    pub sources: SourcePaths,
}

/// Merge engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Emit KACE instance counts and let them feed MultiInstanceFlag
    pub kace_duplicate_detection: bool,
    /// Merge name keys on the rayon thread pool
    pub parallel: bool,
}

impl Default for MergeSettings {
    fn default() -> Self {
        let options = MergeOptions::default();
        Self {
            kace_duplicate_detection: options.kace_duplicate_detection,
            parallel: options.parallel,
        }
    }
}

/// Flattening settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenSettings {
    /// Properties holding string-keyed dictionaries (e.g. extensionAttributes)
    pub dictionary_properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// off, error, warn, info, debug or trace
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parse a log level name as accepted in the config file and on the command line
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| {
            anyhow!(
                "Invalid log level '{}' (expected off, error, warn, info, debug or trace)",
                level
            )
        })
}

impl AppConfiguration {
    /// Default config file location, `<config_dir>/devicescope/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("Could not determine the user configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfiguration = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one when it exists
    ///
    /// An explicitly named file must exist. A missing default file yields
    /// the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_config_path() {
            Ok(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        parse_log_level(&self.logging.level)?;
        if self
            .flatten
            .dictionary_properties
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(anyhow!("dictionary_properties must not contain empty names"));
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        parse_log_level(&self.logging.level)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            kace_duplicate_detection: self.merge.kace_duplicate_detection,
            parallel: self.merge.parallel,
        }
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            dictionary_properties: self.flatten.dictionary_properties.clone(),
        }
    }
}
