//! Export module for nfe-backup
//!
//! Provides the semicolon-delimited invoice report consumed by spreadsheet
//! tools, plus the aggregation of rows and totals behind it.

pub mod csv;

pub use self::csv::{
    compute_grand_total, save_report, write_report_csv, AggregateReport, SaveOutcome,
    GRAND_TOTAL_LABEL, REPORT_HEADER,
};
