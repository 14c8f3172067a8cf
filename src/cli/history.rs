//! CLI handler for the run history

use crate::config::NfePaths;
use crate::display::format_history;
use crate::error::NfeResult;
use crate::services::RunHistory;

/// Handle `nfe-backup history`
pub fn handle_history_command(paths: &NfePaths, limit: usize) -> NfeResult<()> {
    let history = RunHistory::new(paths.run_history_file());
    let records = history.read_recent(limit)?;
    println!("{}", format_history(&records));
    Ok(())
}
