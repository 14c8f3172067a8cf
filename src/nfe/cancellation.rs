//! Cancellation event scanning
//!
//! Cancellation events (`tpEvento` 110111) are separate documents that point
//! at the voided invoice through `chNFe`. The scan walks the whole tree once
//! per run; its result is shared by every invoice extraction.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use super::{emit, file_name, walk_xml_files, LogFn};
use crate::models::CanceledKeySet;

const EVENT_MARKER: &str = "<evento";
const CANCELLATION_TYPE: &str = "<tpEvento>110111</tpEvento>";

fn referenced_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<chNFe>([0-9]{44})</chNFe>").expect("chNFe pattern is valid")
    })
}

/// The voided key, if `text` is a cancellation event document
///
/// The event marker is matched case-insensitively, the event type literally.
pub fn canceled_key_in_text(text: &str) -> Option<String> {
    if !text.to_lowercase().contains(EVENT_MARKER) || !text.contains(CANCELLATION_TYPE) {
        return None;
    }
    referenced_key_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Collect the keys of every canceled invoice under `root`
///
/// Unreadable or undecodable files are skipped.
pub fn find_canceled_keys(root: &Path, log: LogFn<'_>) -> CanceledKeySet {
    emit(log, "Checking for canceled invoices...");

    let mut canceled = CanceledKeySet::new();
    for path in walk_xml_files(root, log) {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                debug!(file = %path.display(), error = %err, "Skipping unreadable file");
                continue;
            }
        };

        if let Some(key) = canceled_key_in_text(&text) {
            debug!(file = %file_name(&path), key = %key, "Found cancellation event");
            canceled.insert(key);
        }
    }

    info!(count = canceled.len(), "Canceled invoice scan complete");
    emit(log, &format!("Found {} canceled invoices.", canceled.len()));
    canceled
}
