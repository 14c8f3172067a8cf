//! Copy and compression of the selected documents
//!
//! Selected files are copied flat into `<dest>/<YYYY-MM>_<MÊS>/` and the
//! copies are compressed into `<dest>/NFEs_<MES>_<YYYY>.zip`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{NfeError, NfeResult};
use crate::models::ReferenceMonth;

/// Create (if needed) and return the month folder under `destination_base`
pub fn prepare_month_folder(destination_base: &Path, month: ReferenceMonth) -> NfeResult<PathBuf> {
    let folder = destination_base.join(month.folder_name());
    std::fs::create_dir_all(&folder).map_err(|e| {
        NfeError::Archive(format!("Failed to create {}: {}", folder.display(), e))
    })?;
    Ok(folder)
}

/// Copy `file` into `dest_dir`, keeping its file name
///
/// An existing file of the same name is overwritten.
pub fn copy_into(file: &Path, dest_dir: &Path) -> NfeResult<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| NfeError::Archive(format!("Not a file: {}", file.display())))?;
    let target = dest_dir.join(name);

    std::fs::copy(file, &target).map_err(|e| {
        NfeError::Archive(format!(
            "Failed to copy '{}': {}",
            name.to_string_lossy(),
            e
        ))
    })?;

    debug!(from = %file.display(), to = %target.display(), "Copied document");
    Ok(target)
}

/// Compress `files` into a fresh archive at `archive_path`
///
/// Entries are stored flat under their file names. A previous archive at the
/// same path is replaced.
pub fn create_archive(archive_path: &Path, files: &[PathBuf]) -> NfeResult<PathBuf> {
    if archive_path.exists() {
        std::fs::remove_file(archive_path).map_err(|e| {
            NfeError::Archive(format!(
                "Failed to remove old archive {}: {}",
                archive_path.display(),
                e
            ))
        })?;
    }

    let file = File::create(archive_path).map_err(|e| {
        NfeError::Archive(format!("Failed to create {}: {}", archive_path.display(), e))
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| NfeError::Archive(format!("Not a file: {}", path.display())))?;
        let contents = std::fs::read(path)?;

        zip.start_file(name, options)?;
        zip.write_all(&contents)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;

    info!(path = %archive_path.display(), entries = files.len(), "Archive written");
    Ok(archive_path.to_path_buf())
}
