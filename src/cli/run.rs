//! CLI handler for the monthly backup run
//!
//! The run executes on a worker thread; this handler only renders the
//! progress events it receives and records the outcome in the run history.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::warn;

use crate::config::{NfePaths, RunOverrides, Settings};
use crate::display::format_run_summary;
use crate::error::{NfeError, NfeResult};
use crate::models::ReferenceMonth;
use crate::services::{spawn_run, ProgressEvent, RunHistory, RunRecord, RunStatus};

/// Arguments of `nfe-backup run`
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Reference month (YYYY-MM); defaults to the previous calendar month
    #[arg(short, long, value_parser = ReferenceMonth::parse)]
    pub month: Option<ReferenceMonth>,

    /// Source folder (overrides the configured one)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination base folder (overrides the configured one)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Skip the ZIP archive
    #[arg(long)]
    pub no_archive: bool,

    /// Skip the upload even if enabled in the settings
    #[arg(long)]
    pub no_upload: bool,
}

/// Renders progress events as terminal lines
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    total: Option<usize>,
    done: usize,
}

impl ProgressPrinter {
    /// Update state with `event` and return the line to print, if any
    pub fn render(&mut self, event: ProgressEvent) -> Option<String> {
        match event {
            ProgressEvent::Log(line) => Some(match self.total {
                Some(total) => format!("[{:>3}/{}] {}", self.done, total, line),
                None => line,
            }),
            ProgressEvent::BeginIndeterminate => {
                self.total = None;
                self.done = 0;
                None
            }
            ProgressEvent::SetupDeterminate(total) => {
                self.total = Some(total);
                self.done = 0;
                None
            }
            ProgressEvent::Step(n) => {
                self.done += n;
                if let Some(total) = self.total {
                    self.done = self.done.min(total);
                }
                None
            }
            ProgressEvent::Finished => None,
        }
    }
}

/// Handle `nfe-backup run`
///
/// Fatal run errors are returned after the run has been recorded.
pub fn handle_run_command(
    paths: &NfePaths,
    settings: &Settings,
    args: RunArgs,
) -> NfeResult<RunStatus> {
    let month = args.month.unwrap_or_else(ReferenceMonth::previous);
    let overrides = RunOverrides {
        source_dir: args.source,
        destination_base: args.dest,
        no_archive: args.no_archive,
        no_upload: args.no_upload,
    };
    let config = settings.run_config(&overrides);

    let started_at = Utc::now();
    let (handle, events) = spawn_run(config, month);

    let mut printer = ProgressPrinter::default();
    for event in events {
        if let Some(line) = printer.render(event) {
            println!("{}", line);
        }
    }

    let outcome = handle
        .join()
        .unwrap_or_else(|_| Err(NfeError::Worker("run thread panicked".into())));

    let record = RunRecord::from_outcome(started_at, month, &outcome);
    if let Err(e) = RunHistory::new(paths.run_history_file()).append(&record) {
        warn!(error = %e, "Could not record run history");
    }

    let summary = outcome?;
    println!();
    print!("{}", format_run_summary(month, &summary));
    Ok(record.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_prefixes_determinate_lines() {
        let mut printer = ProgressPrinter::default();

        assert_eq!(
            printer.render(ProgressEvent::Log("scanning".into())),
            Some("scanning".to_string())
        );
        assert_eq!(printer.render(ProgressEvent::SetupDeterminate(4)), None);
        printer.render(ProgressEvent::Step(1));
        assert_eq!(
            printer.render(ProgressEvent::Log("copying".into())),
            Some("[  1/4] copying".to_string())
        );
    }

    #[test]
    fn test_printer_clamps_steps() {
        let mut printer = ProgressPrinter::default();
        printer.render(ProgressEvent::SetupDeterminate(2));
        printer.render(ProgressEvent::Step(5));
        assert_eq!(
            printer.render(ProgressEvent::Log("done".into())),
            Some("[  2/2] done".to_string())
        );
        assert_eq!(printer.render(ProgressEvent::Finished), None);
    }
}
