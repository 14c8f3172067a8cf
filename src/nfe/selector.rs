//! Reference-month file selection
//!
//! Walks a source tree and keeps the documents whose access key was issued in
//! the reference month. File timestamps are never consulted.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{emit, file_name, walk_xml_files, LogFn};
use super::key_extractor::extract_access_key;
use super::month_matcher::key_matches_month;
use crate::error::{NfeError, NfeResult};
use crate::models::{AccessKey, ReferenceMonth};

/// How often a "checked N/M" progress line is emitted
const PROGRESS_INTERVAL: usize = 100;

/// Optional selection rules beyond the month match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Drop keys whose mod-11 check digit does not verify
    pub require_valid_check_digit: bool,
}

/// Select the documents of `month` under `root`
///
/// # Errors
///
/// Only fails when `root` itself cannot be read. Problems with individual
/// files are logged and the file is skipped.
pub fn select_files_for_month(
    root: &Path,
    month: ReferenceMonth,
    log: LogFn<'_>,
) -> NfeResult<Vec<PathBuf>> {
    select_files_with(root, month, SelectionOptions::default(), log)
}

/// Select the documents of `month` under `root` with extra rules
pub fn select_files_with(
    root: &Path,
    month: ReferenceMonth,
    options: SelectionOptions,
    log: LogFn<'_>,
) -> NfeResult<Vec<PathBuf>> {
    std::fs::read_dir(root).map_err(|e| NfeError::source_directory(root, e))?;

    emit(log, &format!("Searching for .xml files in '{}'...", root.display()));
    emit(log, "Filtering by access key issue month/year.");

    let candidates = walk_xml_files(root, log);
    let total = candidates.len();
    info!(root = %root.display(), total, month = %month, "Checking access keys");
    emit(
        log,
        &format!("Found {} XML files in total. Checking access keys...", total),
    );

    let mut selected = Vec::new();
    for (index, path) in candidates.into_iter().enumerate() {
        let checked = index + 1;
        if checked % PROGRESS_INTERVAL == 0 {
            emit(log, &format!("Checked {}/{} files...", checked, total));
        }

        let key = match extract_access_key(&path) {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!(file = %path.display(), "No access key found");
                continue;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Skipping file");
                emit(
                    log,
                    &format!("WARNING: error checking {}: {}", file_name(&path), err),
                );
                continue;
            }
        };

        if !key_matches_month(&key, month) {
            continue;
        }

        if options.require_valid_check_digit {
            let valid = AccessKey::parse(&key)
                .map(|k| k.has_valid_check_digit())
                .unwrap_or(false);
            if !valid {
                warn!(file = %path.display(), key = %key, "Check digit mismatch");
                emit(
                    log,
                    &format!(
                        "WARNING: {} skipped, check digit does not verify",
                        file_name(&path)
                    ),
                );
                continue;
            }
        }

        emit(
            log,
            &format!("INCLUDED: {} (AAMM: {})", file_name(&path), &key[2..6]),
        );
        selected.push(path);
    }

    info!(selected = selected.len(), "File selection complete");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfe::fixtures::{cancellation_xml, invoice_xml, KEY_2401, KEY_2402};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    fn january() -> ReferenceMonth {
        ReferenceMonth::new(2024, 1).unwrap()
    }

    fn write_invoice(dir: &Path, name: &str, key: &str) {
        fs::write(dir.join(name), invoice_xml(key, &[("1", "Item", "1.00")], "1.00")).unwrap();
    }

    #[test]
    fn test_selects_matching_month_only() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2024").join("02");
        fs::create_dir_all(&nested).unwrap();
        write_invoice(temp_dir.path(), "jan_b.xml", KEY_2401);
        write_invoice(temp_dir.path(), "jan_a.xml", KEY_2401);
        write_invoice(&nested, "feb.xml", KEY_2402);
        fs::write(temp_dir.path().join("canc.xml"), cancellation_xml(KEY_2401)).unwrap();

        let selected = select_files_for_month(temp_dir.path(), january(), None).unwrap();
        let names: Vec<String> = selected.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["jan_a.xml", "jan_b.xml"]);

        let feb = ReferenceMonth::new(2024, 2).unwrap();
        let selected = select_files_for_month(temp_dir.path(), feb, None).unwrap();
        assert_eq!(selected, vec![nested.join("feb.xml")]);
    }

    #[test]
    fn test_per_file_errors_are_logged_not_raised() {
        let temp_dir = TempDir::new().unwrap();
        write_invoice(temp_dir.path(), "good.xml", KEY_2401);
        fs::write(temp_dir.path().join("bad.xml"), [0xc3, 0x28]).unwrap();

        let messages = RefCell::new(Vec::new());
        let log = |m: &str| messages.borrow_mut().push(m.to_string());
        let selected = select_files_for_month(temp_dir.path(), january(), Some(&log)).unwrap();

        assert_eq!(selected.len(), 1);
        assert!(messages
            .borrow()
            .iter()
            .any(|m| m.starts_with("WARNING: error checking bad.xml")));
        assert!(messages
            .borrow()
            .iter()
            .any(|m| m == "INCLUDED: good.xml (AAMM: 2401)"));
    }

    #[test]
    fn test_callback_does_not_change_result() {
        let temp_dir = TempDir::new().unwrap();
        write_invoice(temp_dir.path(), "a.xml", KEY_2401);
        write_invoice(temp_dir.path(), "b.xml", KEY_2402);

        let log = |_: &str| {};
        let with_log = select_files_for_month(temp_dir.path(), january(), Some(&log)).unwrap();
        let without = select_files_for_month(temp_dir.path(), january(), None).unwrap();
        assert_eq!(with_log, without);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let err = select_files_for_month(&temp_dir.path().join("missing"), january(), None)
            .unwrap_err();
        assert!(matches!(err, NfeError::SourceDirectory { .. }));
    }

    #[test]
    fn test_check_digit_option() {
        let temp_dir = TempDir::new().unwrap();
        let base = &KEY_2401[..43];
        let expected = AccessKey::parse(KEY_2401).unwrap().expected_check_digit();
        let good = format!("{}{}", base, expected);
        let bad = format!("{}{}", base, (expected + 1) % 10);
        write_invoice(temp_dir.path(), "good.xml", &good);
        write_invoice(temp_dir.path(), "bad.xml", &bad);

        let strict = SelectionOptions {
            require_valid_check_digit: true,
        };
        let selected = select_files_with(temp_dir.path(), january(), strict, None).unwrap();
        assert_eq!(selected, vec![temp_dir.path().join("good.xml")]);

        let lenient = select_files_for_month(temp_dir.path(), january(), None).unwrap();
        assert_eq!(lenient.len(), 2);
    }
}
