//! The monthly backup run
//!
//! One run: check prerequisites, scan for cancellation events, select the
//! reference month's documents, copy them, build the CSV report, compress the
//! copies and optionally upload archive and report.
//!
//! Only prerequisite failures and an unreadable source directory abort a run.
//! Every later failure is recorded in `RunSummary::errors` and the run
//! continues with the next step.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{error, warn};

use super::archive::{copy_into, create_archive, prepare_month_folder};
use super::history::RunStatus;
use super::progress::{ProgressEvent, ProgressReporter};
use super::upload::{remote_folder, RcloneUploader, Uploader};
use crate::config::RunConfig;
use crate::error::{NfeError, NfeResult};
use crate::export::{save_report, AggregateReport, SaveOutcome};
use crate::models::{Money, ReferenceMonth};
use crate::nfe::{extract_invoice_rows, find_canceled_keys, select_files_with, LogFn, SelectionOptions};

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents whose access key matched the month
    pub selected: usize,
    /// Documents copied into the month folder
    pub copied: usize,
    /// Report rows (one per line item)
    pub rows: usize,
    /// Distinct invoices in the report
    pub invoices: usize,
    /// Keys found in cancellation events
    pub canceled_keys: usize,
    /// Sum of authorized invoice totals
    pub grand_total: Money,
    pub month_folder: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    /// Local files that reached the remote
    pub uploaded: Vec<PathBuf>,
    /// Non-fatal failures, in the order they happened
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn status(&self) -> RunStatus {
        if self.errors.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::CompletedWithErrors
        }
    }
}

/// Problems that prevent a run from starting
pub fn check_prerequisites(config: &RunConfig, uploader: Option<&dyn Uploader>) -> Vec<String> {
    let mut problems = Vec::new();

    if !config.source_dir.is_dir() {
        problems.push(format!(
            "Source folder not found: '{}'",
            config.source_dir.display()
        ));
    }

    if let Some(uploader) = uploader {
        problems.extend(uploader.check());
    }

    problems
}

/// Steps of the determinate phase
///
/// One for setup, one per selected file, one for the report, one for the
/// archive and one per uploaded file.
fn total_steps(selected: usize, archive: bool, upload: bool) -> usize {
    let mut steps = 1 + selected + 1;
    if archive {
        steps += 1;
    }
    if upload {
        steps += 2;
    }
    steps
}

/// Run the pipeline with the uploader described by `config`
pub fn run(
    config: &RunConfig,
    month: ReferenceMonth,
    progress: &ProgressReporter,
) -> NfeResult<RunSummary> {
    let uploader = config.upload.clone().map(RcloneUploader::new);
    run_with(
        config,
        month,
        uploader.as_ref().map(|u| u as &dyn Uploader),
        progress,
    )
}

/// Run the pipeline with an explicit uploader
pub fn run_with(
    config: &RunConfig,
    month: ReferenceMonth,
    uploader: Option<&dyn Uploader>,
    progress: &ProgressReporter,
) -> NfeResult<RunSummary> {
    let started = Instant::now();
    progress.log("--- STARTING BACKUP RUN ---");
    progress.begin_indeterminate();

    if config.prerequisites_check {
        progress.log("Checking prerequisites...");
        let problems = check_prerequisites(config, uploader);
        if !problems.is_empty() {
            for problem in &problems {
                progress.log(&format!("ERROR: {}", problem));
            }
            return Err(NfeError::Prerequisites(problems));
        }
        progress.log("Prerequisites verified.");
    }

    progress.log(&format!(
        "Looking for invoices of {} by access key",
        month
    ));

    let log = |message: &str| progress.log(message);
    let log_fn: LogFn<'_> = Some(&log);

    let canceled = find_canceled_keys(&config.source_dir, log_fn);
    let options = SelectionOptions {
        require_valid_check_digit: config.validate_check_digit,
    };
    let selected = select_files_with(&config.source_dir, month, options, log_fn)?;
    let month_folder = prepare_month_folder(&config.destination_base, month)?;

    let mut summary = RunSummary {
        selected: selected.len(),
        canceled_keys: canceled.len(),
        month_folder: Some(month_folder.clone()),
        ..RunSummary::default()
    };

    if selected.is_empty() {
        progress.log(&format!(
            "No XML file of {} was found by access key.",
            month
        ));
        progress.log(&format!("Total run time: {:.1?}", started.elapsed()));
        return Ok(summary);
    }

    progress.log(&format!(
        "RESULT: {} files of {} will be copied.",
        selected.len(),
        month
    ));
    let upload_target = match (uploader, &config.upload) {
        (Some(uploader), Some(settings)) => Some((
            uploader,
            remote_folder(settings, &config.client_name, &month.folder_name()),
        )),
        _ => None,
    };
    progress.setup_determinate(total_steps(
        selected.len(),
        config.archive_enabled,
        upload_target.is_some(),
    ));
    progress.step();

    let copied = copy_selected(&selected, &month_folder, progress, &mut summary.errors);
    summary.copied = copied.len();

    if !copied.is_empty() {
        progress.log("Extracting invoice data...");
        let mut report = AggregateReport::new();
        for path in &copied {
            report.extend(extract_invoice_rows(path, &canceled, log_fn));
        }
        summary.rows = report.len();
        summary.invoices = report.invoice_count();
        summary.grand_total = report.grand_total();

        let report_path = config.destination_base.join(month.report_file_name());
        match save_report(&report_path, &report, log_fn) {
            Ok(SaveOutcome::Saved(path)) => summary.report_path = Some(path),
            Ok(SaveOutcome::NothingToSave) => {}
            Err(err) => record_failure(progress, &mut summary.errors, err),
        }
        progress.step();
    }

    if config.archive_enabled {
        let archive_path = config.destination_base.join(month.archive_file_name());
        progress.log(&format!(
            "Compressing into '{}'...",
            archive_path.display()
        ));
        match create_archive(&archive_path, &copied) {
            Ok(path) => {
                progress.log("Compression finished.");
                summary.archive_path = Some(path);
            }
            Err(err) => record_failure(progress, &mut summary.errors, err),
        }
        progress.step();
    }

    if let Some((uploader, remote_dir)) = upload_target {
        progress.log("Uploading to remote storage...");
        let files: Vec<PathBuf> = summary
            .archive_path
            .iter()
            .chain(summary.report_path.iter())
            .cloned()
            .collect();
        for file in files {
            match uploader.upload(&file, &remote_dir) {
                Ok(()) => {
                    progress.log(&format!("SUCCESS: uploaded '{}'.", display_name(&file)));
                    summary.uploaded.push(file);
                    progress.step();
                }
                Err(err) => record_failure(progress, &mut summary.errors, err),
            }
        }
    }

    progress.log(&format!("Total run time: {:.1?}", started.elapsed()));
    Ok(summary)
}

fn copy_selected(
    selected: &[PathBuf],
    month_folder: &Path,
    progress: &ProgressReporter,
    errors: &mut Vec<String>,
) -> Vec<PathBuf> {
    let mut copied: Vec<PathBuf> = Vec::with_capacity(selected.len());
    for file in selected {
        match copy_into(file, month_folder) {
            Ok(target) => {
                // Same file name from another folder: the earlier copy is gone
                if copied.contains(&target) {
                    warn!(from = %file.display(), to = %target.display(), "Copy overwrote an earlier copy");
                    progress.log(&format!(
                        "WARNING: '{}' overwrote a file copied earlier in this run ({})",
                        display_name(&target),
                        file.display()
                    ));
                } else {
                    copied.push(target);
                }
                progress.step();
            }
            Err(err) => record_failure(progress, errors, err),
        }
    }
    copied
}

fn record_failure(progress: &ProgressReporter, errors: &mut Vec<String>, err: NfeError) {
    warn!(error = %err, "Run step failed");
    progress.log(&format!("ERROR: {}", err));
    errors.push(err.to_string());
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run the pipeline on a background thread
///
/// Progress arrives on the returned receiver and always ends with
/// `ProgressEvent::Finished`. The join handle yields the run's result.
pub fn spawn_run(
    config: RunConfig,
    month: ReferenceMonth,
) -> (JoinHandle<NfeResult<RunSummary>>, Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let progress = ProgressReporter::new(tx);
        let result = run(&config, month, &progress);
        if let Err(err) = &result {
            error!(error = %err, "Run aborted");
            progress.log(&format!("UNEXPECTED ERROR: {}", err));
        }
        progress.finished();
        result
    });

    (handle, rx)
}
