//! Delivery of the archive and report to remote storage
//!
//! Uploads go through the external `rclone` binary. The configuration file
//! is always `rclone.conf` in the binary's directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::UploadSettings;
use crate::error::{NfeError, NfeResult};

/// Something that can push local files to a remote folder
pub trait Uploader {
    /// Problems that would make uploads fail; empty when ready
    fn check(&self) -> Vec<String>;

    /// Copy `file` into `remote_dir`
    fn upload(&self, file: &Path, remote_dir: &str) -> NfeResult<()>;
}

/// Remote folder for one run: `<base>/<client>/<folder>/`
pub fn remote_folder(settings: &UploadSettings, client_name: &str, folder_name: &str) -> String {
    format!(
        "{}/{}/{}/",
        settings.drive_base_folder, client_name, folder_name
    )
}

/// `rclone`-backed uploader
#[derive(Debug, Clone)]
pub struct RcloneUploader {
    settings: UploadSettings,
}

impl RcloneUploader {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    /// `rclone.conf` next to the binary
    pub fn config_path(&self) -> PathBuf {
        self.settings
            .rclone_path
            .parent()
            .map(|dir| dir.join("rclone.conf"))
            .unwrap_or_else(|| PathBuf::from("rclone.conf"))
    }

    fn remote_target(&self, remote_dir: &str) -> String {
        format!("{}:{}", self.settings.remote_name, remote_dir)
    }
}

impl Uploader for RcloneUploader {
    fn check(&self) -> Vec<String> {
        let rclone = &self.settings.rclone_path;
        if !rclone.exists() {
            return vec![format!("rclone not found at '{}'", rclone.display())];
        }

        let config = self.config_path();
        if !config.exists() {
            return vec![format!(
                "rclone configuration file not found: '{}'",
                config.display()
            )];
        }

        let output = match Command::new(rclone)
            .arg("listremotes")
            .arg("--config")
            .arg(&config)
            .output()
        {
            Ok(output) => output,
            Err(e) => return vec![format!("Failed to run rclone: {}", e)],
        };

        if !output.status.success() {
            return vec![format!(
                "Error checking rclone configuration: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )];
        }

        let remotes = String::from_utf8_lossy(&output.stdout);
        let wanted = format!("{}:", self.settings.remote_name);
        if remotes.lines().any(|line| line.trim() == wanted) {
            Vec::new()
        } else {
            vec![format!(
                "Remote '{}' not found in the rclone configuration",
                self.settings.remote_name
            )]
        }
    }

    fn upload(&self, file: &Path, remote_dir: &str) -> NfeResult<()> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        if !file.exists() {
            return Err(NfeError::Upload(format!("Local file does not exist: {}", name)));
        }

        let target = self.remote_target(remote_dir);
        debug!(file = %file.display(), target = %target, "Running rclone copy");

        let output = Command::new(&self.settings.rclone_path)
            .arg("copy")
            .arg(file)
            .arg(&target)
            .arg("--config")
            .arg(self.config_path())
            .output()
            .map_err(|e| NfeError::Upload(format!("Failed to run rclone: {}", e)))?;

        if !output.status.success() {
            return Err(NfeError::Upload(format!(
                "Upload of {} failed: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!(file = %name, target = %target, "Upload complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(rclone_path: PathBuf) -> UploadSettings {
        UploadSettings {
            enabled: true,
            rclone_path,
            remote_name: "Drive".into(),
            drive_base_folder: "CLIENTES".into(),
        }
    }

    #[test]
    fn test_remote_folder() {
        let settings = settings(PathBuf::from("/opt/rclone/rclone"));
        assert_eq!(
            remote_folder(&settings, "Mercado Central", "2024-01_JANEIRO"),
            "CLIENTES/Mercado Central/2024-01_JANEIRO/"
        );
    }

    #[test]
    fn test_config_path_next_to_binary() {
        let uploader = RcloneUploader::new(settings(PathBuf::from("/opt/rclone/rclone")));
        assert_eq!(uploader.config_path(), PathBuf::from("/opt/rclone/rclone.conf"));
        assert_eq!(uploader.remote_target("A/B/"), "Drive:A/B/");
    }

    #[test]
    fn test_check_missing_binary() {
        let temp_dir = TempDir::new().unwrap();
        let uploader = RcloneUploader::new(settings(temp_dir.path().join("rclone")));

        let problems = uploader.check();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("rclone not found"));
    }

    #[test]
    fn test_check_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let binary = temp_dir.path().join("rclone");
        std::fs::write(&binary, "").unwrap();
        let uploader = RcloneUploader::new(settings(binary));

        let problems = uploader.check();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("rclone.conf"));
    }

    #[test]
    fn test_upload_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let uploader = RcloneUploader::new(settings(temp_dir.path().join("rclone")));

        let err = uploader
            .upload(&temp_dir.path().join("missing.zip"), "X/")
            .unwrap_err();
        assert!(matches!(err, NfeError::Upload(_)));
    }
}
