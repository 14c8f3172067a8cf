//! CLI handlers that inspect documents without running a backup
//!
//! `select`, `canceled`, `report` and `key` read the source tree and never
//! write anything except the report file requested by `report`.

use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::display::{format_canceled_keys, format_key_details, format_selection, SelectedDocument};
use crate::error::NfeResult;
use crate::export::{save_report, AggregateReport, SaveOutcome};
use crate::models::ReferenceMonth;
use crate::nfe::{
    extract_access_key, extract_invoice_rows, find_canceled_keys, select_files_with,
    SelectionOptions,
};

/// Arguments of `nfe-backup select`
#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Reference month (YYYY-MM); defaults to the previous calendar month
    #[arg(short, long, value_parser = ReferenceMonth::parse)]
    pub month: Option<ReferenceMonth>,

    /// Source folder (overrides the configured one)
    #[arg(long)]
    pub source: Option<PathBuf>,
}

/// Arguments of `nfe-backup report`
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output CSV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Reference month (YYYY-MM); defaults to the previous calendar month
    #[arg(short, long, value_parser = ReferenceMonth::parse)]
    pub month: Option<ReferenceMonth>,

    /// Source folder (overrides the configured one)
    #[arg(long)]
    pub source: Option<PathBuf>,
}

fn selection_options(settings: &Settings) -> SelectionOptions {
    SelectionOptions {
        require_valid_check_digit: settings.validate_check_digit,
    }
}

/// Handle `nfe-backup select`
pub fn handle_select_command(settings: &Settings, args: SelectArgs) -> NfeResult<()> {
    let root = args.source.unwrap_or_else(|| settings.source_dir.clone());
    let month = args.month.unwrap_or_else(ReferenceMonth::previous);

    let selected = select_files_with(&root, month, selection_options(settings), None)?;

    let documents: Vec<SelectedDocument> = selected
        .into_iter()
        .filter_map(|path| match extract_access_key(&path) {
            Ok(Some(key)) => Some(SelectedDocument { path, key }),
            _ => None,
        })
        .collect();

    println!("Documents for {} in {}:", month, root.display());
    println!("{}", format_selection(&documents));
    Ok(())
}

/// Handle `nfe-backup canceled`
pub fn handle_canceled_command(settings: &Settings, source: Option<PathBuf>) -> NfeResult<()> {
    let root = source.unwrap_or_else(|| settings.source_dir.clone());
    let keys = find_canceled_keys(&root, None);
    println!("{}", format_canceled_keys(&keys));
    Ok(())
}

/// Handle `nfe-backup report`
///
/// Builds the report straight from the source tree, without copying.
pub fn handle_report_command(settings: &Settings, args: ReportArgs) -> NfeResult<()> {
    let root = args.source.unwrap_or_else(|| settings.source_dir.clone());
    let month = args.month.unwrap_or_else(ReferenceMonth::previous);

    let selected = select_files_with(&root, month, selection_options(settings), None)?;
    let canceled = find_canceled_keys(&root, None);

    let mut report = AggregateReport::new();
    for path in &selected {
        report.extend(extract_invoice_rows(path, &canceled, None));
    }

    match save_report(&args.output, &report, None)? {
        SaveOutcome::Saved(path) => {
            println!("Report written to: {}", path.display());
            println!(
                "{} row(s) from {} invoice(s), grand total {}",
                report.len(),
                report.invoice_count(),
                report.grand_total()
            );
        }
        SaveOutcome::NothingToSave => {
            println!("No invoice data for {}; no report written.", month);
        }
    }

    Ok(())
}

/// Handle `nfe-backup key`
pub fn handle_key_command(file: PathBuf) -> NfeResult<()> {
    let key = extract_access_key(&file)?;
    print!("{}", format_key_details(&file, key.as_deref()));
    Ok(())
}
