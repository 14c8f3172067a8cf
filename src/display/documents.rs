//! Document display formatting
//!
//! Formats selected documents, canceled keys and single-key details.

use std::path::{Path, PathBuf};

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{AccessKey, CanceledKeySet};

/// A selected document with the period encoded in its key
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    pub path: PathBuf,
    pub key: String,
}

#[derive(Tabled)]
struct SelectedRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "YYMM")]
    yymm: String,
    #[tabled(rename = "Access key")]
    key: String,
}

/// Format the documents selected for a month as a table
pub fn format_selection(documents: &[SelectedDocument]) -> String {
    if documents.is_empty() {
        return "No documents found for this month.".to_string();
    }

    let rows: Vec<SelectedRow> = documents
        .iter()
        .map(|doc| SelectedRow {
            file: doc.path.display().to_string(),
            yymm: doc.key.get(2..6).unwrap_or("").to_string(),
            key: doc.key.clone(),
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push_str(&format!("\n\n{} document(s) selected.", documents.len()));
    output
}

/// Format canceled keys, one per line, sorted
pub fn format_canceled_keys(keys: &CanceledKeySet) -> String {
    if keys.is_empty() {
        return "No canceled invoices found.".to_string();
    }

    let mut sorted: Vec<&String> = keys.iter().collect();
    sorted.sort();

    let mut output = String::new();
    for key in sorted {
        output.push_str(key);
        output.push('\n');
    }
    output.push_str(&format!("\n{} canceled invoice(s).", keys.len()));
    output
}

/// Format what is known about the access key of one document
pub fn format_key_details(path: &Path, key: Option<&str>) -> String {
    let mut output = format!("File:         {}\n", path.display());

    let Some(key) = key else {
        output.push_str("Access key:   (none found)\n");
        return output;
    };

    output.push_str(&format!("Access key:   {}\n", key));
    match AccessKey::parse(key) {
        Ok(parsed) => {
            let (year, month) = parsed.year_month();
            output.push_str(&format!("Period:       {:02}/{:04}\n", month, year));
            let check = if parsed.has_valid_check_digit() {
                "valid".to_string()
            } else {
                format!(
                    "INVALID (expected {}, found {})",
                    parsed.expected_check_digit(),
                    parsed.check_digit()
                )
            };
            output.push_str(&format!("Check digit:  {}\n", check));
        }
        Err(e) => output.push_str(&format!("Invalid key:  {}\n", e)),
    }

    output
}
