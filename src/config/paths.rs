//! Path management for nfe-backup
//!
//! Resolves where the settings file and run history live.
//!
//! ## Path Resolution Order
//!
//! 1. `NFE_BACKUP_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/nfe-backup` on Linux,
//!    `%APPDATA%\nfe-backup\config` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::NfeError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "NFE_BACKUP_DATA_DIR";

/// Manages all paths used by nfe-backup
#[derive(Debug, Clone)]
pub struct NfePaths {
    /// Base directory for settings and history
    base_dir: PathBuf,
}

impl NfePaths {
    /// Create a new NfePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, NfeError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("br", "nfe-backup", "nfe-backup")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    NfeError::Config("Could not determine the configuration directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create NfePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the run history (one JSON record per line)
    pub fn run_history_file(&self) -> PathBuf {
        self.base_dir.join("runs.jsonl")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), NfeError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| NfeError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
