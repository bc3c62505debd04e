//! Runtime configuration
//!
//! Values come from an optional YAML file. Anything the file leaves out falls
//! back to a default under the user cache directory. The CLI layers its flags
//! and environment variables on top of the loaded file.

use crate::error::{Error, Result};
use crate::page::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the index animals are mirrored into
pub const DEFAULT_INDEX_NAME: &str = "animal";

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Record store database file
    pub database: PathBuf,
    /// Search index database file
    pub index: PathBuf,
    /// Index name queries are addressed to
    pub index_name: String,
    /// Page size used when the caller gives none
    pub default_page_size: usize,
}

/// On-disk shape, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    database: Option<PathBuf>,
    index: Option<PathBuf>,
    index_name: Option<String>,
    default_page_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: crate::default_db_path(),
            index: crate::default_index_path(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text, filling gaps with defaults
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(text)?
        };

        let defaults = Config::default();
        let config = Config {
            database: file.database.unwrap_or(defaults.database),
            index: file.index.unwrap_or(defaults.index),
            index_name: file.index_name.unwrap_or(defaults.index_name),
            default_page_size: file.default_page_size.unwrap_or(defaults.default_page_size),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::ConfigError(
                "default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.index_name.trim().is_empty() {
            return Err(Error::ConfigError("index_name must not be empty".to_string()));
        }
        Ok(())
    }
}
