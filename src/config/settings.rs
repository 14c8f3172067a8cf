//! User settings for nfe-backup
//!
//! Settings are persisted as JSON and loaded once per run. A run never reads
//! them again: `Settings::run_config` freezes them, together with any
//! command-line overrides, into an immutable `RunConfig`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::NfePaths;
use crate::error::NfeError;

/// Upload collaborator settings (external `rclone` binary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Whether archive and report are uploaded after a run
    pub enabled: bool,

    /// Path to the rclone executable; `rclone.conf` must sit next to it
    pub rclone_path: PathBuf,

    /// Name of the configured rclone remote
    pub remote_name: String,

    /// Base folder on the remote; client and month folders go below it
    pub drive_base_folder: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rclone_path: PathBuf::from("rclone"),
            remote_name: "MeuGoogleDrive".to_string(),
            drive_base_folder: "CLIENTES".to_string(),
        }
    }
}

/// User settings for nfe-backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Directory tree holding the XML documents
    pub source_dir: PathBuf,

    /// Where month folders, archives and reports are written
    pub destination_base: PathBuf,

    /// Client name used for the remote folder
    pub client_name: String,

    /// Whether copied documents are compressed into a ZIP archive
    pub archive_enabled: bool,

    /// Whether keys must pass the mod-11 check digit to be selected
    pub validate_check_digit: bool,

    /// Whether prerequisites are checked before a run
    pub prerequisites_check: bool,

    /// Upload collaborator settings
    pub upload: UploadSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: 1,
            source_dir: PathBuf::from("Xml_IO"),
            destination_base: PathBuf::from("CopiaNotasFiscais"),
            client_name: String::new(),
            archive_enabled: true,
            validate_check_digit: false,
            prerequisites_check: true,
            upload: UploadSettings::default(),
        }
    }
}

/// Per-run overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub source_dir: Option<PathBuf>,
    pub destination_base: Option<PathBuf>,
    pub no_archive: bool,
    pub no_upload: bool,
}

/// Immutable configuration for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub destination_base: PathBuf,
    pub client_name: String,
    pub archive_enabled: bool,
    pub validate_check_digit: bool,
    pub prerequisites_check: bool,
    /// Present only when uploading is enabled
    pub upload: Option<UploadSettings>,
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &NfePaths) -> Result<Self, NfeError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| NfeError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                NfeError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &NfePaths) -> Result<(), NfeError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| NfeError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| NfeError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Freeze these settings and the overrides into a run configuration
    pub fn run_config(&self, overrides: &RunOverrides) -> RunConfig {
        let upload_enabled = self.upload.enabled && !overrides.no_upload;
        RunConfig {
            source_dir: overrides
                .source_dir
                .clone()
                .unwrap_or_else(|| self.source_dir.clone()),
            destination_base: overrides
                .destination_base
                .clone()
                .unwrap_or_else(|| self.destination_base.clone()),
            client_name: self.client_name.clone(),
            archive_enabled: self.archive_enabled && !overrides.no_archive,
            validate_check_digit: self.validate_check_digit,
            prerequisites_check: self.prerequisites_check,
            upload: upload_enabled.then(|| self.upload.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.archive_enabled);
        assert!(!settings.validate_check_digit);
        assert!(!settings.upload.enabled);
        assert_eq!(settings.upload.drive_base_folder, "CLIENTES");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = NfePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.client_name = "Mercado Central".to_string();
        settings.upload.enabled = true;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"source_dir": "/dados/xml"}"#).unwrap();
        assert_eq!(settings.source_dir, PathBuf::from("/dados/xml"));
        assert_eq!(settings.destination_base, PathBuf::from("CopiaNotasFiscais"));
        assert!(settings.archive_enabled);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = NfePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, NfeError::Config(_)));
    }

    #[test]
    fn test_run_config_overrides() {
        let mut settings = Settings::default();
        settings.upload.enabled = true;

        let config = settings.run_config(&RunOverrides::default());
        assert_eq!(config.source_dir, settings.source_dir);
        assert!(config.archive_enabled);
        assert!(config.upload.is_some());

        let overrides = RunOverrides {
            source_dir: Some(PathBuf::from("/tmp/xml")),
            destination_base: None,
            no_archive: true,
            no_upload: true,
        };
        let config = settings.run_config(&overrides);
        assert_eq!(config.source_dir, PathBuf::from("/tmp/xml"));
        assert!(!config.archive_enabled);
        assert!(config.upload.is_none());
    }
}
