//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the pipeline and services.

pub mod documents;
pub mod history;
pub mod run;

pub use documents::{
    handle_canceled_command, handle_key_command, handle_report_command, handle_select_command,
    ReportArgs, SelectArgs,
};
pub use history::handle_history_command;
pub use run::{handle_run_command, ProgressPrinter, RunArgs};
