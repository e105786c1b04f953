//! Configuration module

use crate::archive::ArchiveFormat;
use crate::paths::DEFAULT_ARCHIVE_SUFFIXES;
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tree walk behaviour
    #[serde(default)]
    pub walk: WalkConfig,
    /// Archive detection and probing
    #[serde(default)]
    pub formats: FormatConfig,
}

/// Walk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Delete each archive once it has been extracted
    pub delete_after_extract: bool,
    /// Descend into freshly extracted folders
    pub recursive: bool,
    /// Maximum archive nesting depth to descend into
    pub max_depth: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            delete_after_extract: false,
            recursive: true,
            max_depth: 32,
        }
    }
}

/// Format configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// File name suffixes treated as archives (case-insensitive)
    pub extensions: Vec<String>,
    /// Formats tried, in order, for every archive
    pub probe_order: Vec<ArchiveFormat>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_ARCHIVE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            probe_order: ArchiveFormat::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let unpackr_dir = config_dir.join("unpackr");
        if !unpackr_dir.exists() {
            fs::create_dir_all(&unpackr_dir)?;
        }

        Ok(unpackr_dir.join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# unpackr configuration file

[walk]
# Delete each archive after it was extracted successfully
delete_after_extract = false
# Unpack archives found inside freshly extracted folders
recursive = true
# How many levels of nested archives to descend into
max_depth = 32

[formats]
# File name suffixes that mark a file as an archive (case-insensitive)
extensions = [".7z", ".zip", ".tar.gz", ".tgz", ".bz2", ".tar", ".tbz", ".gz"]
# Formats tried in order until one decodes the file: 7z, zip, tar.gz, tar.bz2, tar
probe_order = ["7z", "zip", "tar.gz", "tar.bz2", "tar"]
"#
        .to_string()
    }

    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            fs::write(&path, Self::default_config_content())?;
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.formats.probe_order.is_empty() {
            return Err(Error::Config("formats.probe_order is empty".to_string()));
        }
        if let Some(bad) = self
            .formats
            .extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(Error::Config(format!(
                "Archive extension must start with '.': {:?}",
                bad
            )));
        }
        Ok(())
    }
}
