//! Service layer for nfe-backup
//!
//! The service layer drives a monthly run on top of the `nfe` pipeline
//! components: copying, compression, report writing, uploads, progress
//! reporting and the run history.

pub mod archive;
pub mod history;
pub mod pipeline;
pub mod progress;
pub mod upload;

pub use history::{RunHistory, RunRecord, RunStatus};
pub use pipeline::{check_prerequisites, run, run_with, spawn_run, RunSummary};
pub use progress::{ProgressEvent, ProgressReporter};
pub use upload::{RcloneUploader, Uploader};
