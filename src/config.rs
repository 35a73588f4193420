use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::email::{FolderFilter, Role};
use crate::store::{EmailStore, StoreError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create config directory")]
    CreateDirError,

    #[error("Config file already exists: {0}")]
    AlreadyExists(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    /// Length of the cosmetic "Loading emails..." screen.
    pub loading_delay_ms: u64,
    /// Characters of content shown in each list entry.
    pub preview_length: usize,
    pub date_format: String,
    pub detail_date_format: String,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: 1000,
            preview_length: 80,
            date_format: "%Y-%m-%d".to_string(),
            detail_date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl UIConfig {
    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub default_role: Role,
    pub default_filter: FolderFilter,
    /// JSON array of records used instead of the built-in sample set.
    pub seed_file: Option<String>,
    pub ui: UIConfig,
}

impl Config {
    /// `~/.config/securemail/config.json`, or a relative path when the
    /// platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("securemail").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("securemail.json"))
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);

        // If the file doesn't exist, return default config
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let path = Path::new(path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::CreateDirError)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Writes the default config to `path`. An existing file is left alone.
    pub fn init_file(path: &str) -> Result<(), ConfigError> {
        if Path::new(path).exists() {
            return Err(ConfigError::AlreadyExists(path.to_string()));
        }
        Config::default().save(path)
    }

    /// Builds the startup store from `seed_file`, or the sample set.
    pub fn load_store(&self) -> Result<EmailStore, StoreError> {
        match &self.seed_file {
            Some(seed) => {
                let path = shellexpand::tilde(seed).into_owned();
                EmailStore::from_json_file(Path::new(&path))
            }
            None => Ok(EmailStore::with_sample_data()),
        }
    }
}
