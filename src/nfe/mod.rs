//! NFe document processing
//!
//! The selection and extraction pipeline for a tree of fiscal XML documents:
//!
//! - `key_extractor`: pull the 44-digit access key out of raw document text
//! - `month_matcher`: decide whether a key belongs to a reference month
//! - `cancellation`: collect keys voided by cancellation events
//! - `selector`: walk a tree and keep the documents of one month
//! - `invoice_parser`: turn one invoice document into per-item rows
//!
//! Every walker takes an optional log callback. The callback only receives
//! human-readable progress lines; passing `None` never changes results.

pub mod cancellation;
pub mod invoice_parser;
pub mod key_extractor;
pub mod month_matcher;
pub mod selector;

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

pub use cancellation::{canceled_key_in_text, find_canceled_keys};
pub use invoice_parser::{extract_invoice_rows, parse_invoice_document};
pub use key_extractor::{extract_access_key, extract_access_key_from_text};
pub use month_matcher::{key_matches_month, key_period};
pub use selector::{select_files_for_month, select_files_with, SelectionOptions};

/// Optional progress callback accepted by the pipeline components
pub type LogFn<'a> = Option<&'a dyn Fn(&str)>;

/// Forward a message to the callback, if any
pub(crate) fn emit(log: LogFn<'_>, message: &str) {
    if let Some(log) = log {
        log(message);
    }
}

/// Check for an `.xml` extension (case-insensitive)
pub fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// All XML files under `root`, in deterministic (file name sorted) walk order
///
/// Entries that cannot be visited are logged and skipped.
pub(crate) fn walk_xml_files(root: &Path, log: LogFn<'_>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable directory entry");
                emit(log, &format!("WARNING: skipping unreadable entry: {}", err));
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_xml_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// File name of a path for messages and report rows
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
