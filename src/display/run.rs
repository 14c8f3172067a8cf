//! Run display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::ReferenceMonth;
use crate::services::{RunRecord, RunSummary};

/// Format the outcome of a run
pub fn format_run_summary(month: ReferenceMonth, summary: &RunSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Run summary for {}\n", month));
    output.push_str(&format!("{:-<40}\n", ""));
    output.push_str(&format!("Status:           {}\n", summary.status()));
    output.push_str(&format!("Selected:         {}\n", summary.selected));
    output.push_str(&format!("Copied:           {}\n", summary.copied));
    output.push_str(&format!("Invoices:         {}\n", summary.invoices));
    output.push_str(&format!("Report rows:      {}\n", summary.rows));
    output.push_str(&format!("Canceled keys:    {}\n", summary.canceled_keys));
    output.push_str(&format!("Grand total:      {}\n", summary.grand_total));

    if let Some(path) = &summary.report_path {
        output.push_str(&format!("Report:           {}\n", path.display()));
    }
    if let Some(path) = &summary.archive_path {
        output.push_str(&format!("Archive:          {}\n", path.display()));
    }
    if !summary.uploaded.is_empty() {
        output.push_str(&format!("Uploaded:         {} file(s)\n", summary.uploaded.len()));
    }

    if !summary.errors.is_empty() {
        output.push_str("\nFailures:\n");
        for error in &summary.errors {
            output.push_str(&format!("  - {}\n", error));
        }
    }

    output
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Selected")]
    selected: usize,
    #[tabled(rename = "Rows")]
    rows: usize,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Errors")]
    errors: usize,
}

/// Format run records as a table, newest last
pub fn format_history(records: &[RunRecord]) -> String {
    if records.is_empty() {
        return "No runs recorded yet.".to_string();
    }

    let rows: Vec<HistoryRow> = records
        .iter()
        .map(|record| HistoryRow {
            started: record
                .started_at
                .with_timezone(&chrono::Local)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string(),
            month: record.month.clone(),
            status: record.status.to_string(),
            selected: record.selected,
            rows: record.rows,
            total: record.grand_total.to_string(),
            errors: record.errors.len(),
        })
        .collect();

    Table::new(rows).with(Style::psql()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::Utc;

    #[test]
    fn test_format_run_summary() {
        let summary = RunSummary {
            selected: 2,
            copied: 2,
            rows: 5,
            invoices: 2,
            grand_total: Money::from_cents(12345),
            errors: vec!["Upload error: remote unavailable".into()],
            ..RunSummary::default()
        };
        let month = ReferenceMonth::new(2024, 1).unwrap();

        let output = format_run_summary(month, &summary);
        assert!(output.starts_with("Run summary for 01/2024"));
        assert!(output.contains("COMPLETED WITH ERRORS"));
        assert!(output.contains("Report rows:      5"));
        assert!(output.contains("  - Upload error: remote unavailable"));
    }

    #[test]
    fn test_format_history() {
        assert_eq!(format_history(&[]), "No runs recorded yet.");

        let month = ReferenceMonth::new(2024, 1).unwrap();
        let record = RunRecord::from_outcome(Utc::now(), month, &Ok(RunSummary::default()));
        let output = format_history(&[record]);
        assert!(output.contains("2024-01"));
        assert!(output.contains("SUCCESS"));
    }
}
