use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::theory::progression::{self, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN};
use crate::theory::ProgressionError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application configuration loaded from TOML config file.
/// Every field has a default, so the file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// CSV dataset to import (used when `--csv` isn't given).
    pub dataset_path: Option<PathBuf>,
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// Number of parallel workers. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
    /// Progression detection bounds.
    pub progressions: ProgressionConfig,
}

/// Lengths scanned by progression detection: `min_len..max_len`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    pub min_len: usize,
    /// Exclusive.
    pub max_len: usize,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl ProgressionConfig {
    /// Checked before a run starts so a bad config fails once, not per song.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        progression::check_bounds(self.min_len, self.max_len)
    }
}

impl AppConfig {
    /// Load config from `~/.config/chordstat/config.toml`. A missing file
    /// gives the defaults; an unreadable one is logged and also gives the
    /// defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path().filter(|p| p.exists()) else {
            log::debug!("No config file found, using defaults");
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}. Using defaults.");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join("chordstat.db")
    } else {
        // Fallback: current directory
        PathBuf::from("chordstat.db")
    }
}
