//! Display formatting for terminal output
//!
//! Formats selections, run summaries and the run history for the CLI.

pub mod documents;
pub mod run;

pub use documents::{format_canceled_keys, format_key_details, format_selection, SelectedDocument};
pub use run::{format_history, format_run_summary};
