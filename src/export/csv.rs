//! CSV report export
//!
//! Writes the per-item invoice report: UTF-8 BOM, `;` delimiter, a fixed
//! 15-column header, one record per row, a blank record and a summary record
//! carrying the grand total.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::nfe::{emit, LogFn};

use crate::error::{NfeError, NfeResult};
use crate::models::{InvoiceRow, Money};

/// Report header, in column order
pub const REPORT_HEADER: [&str; 15] = [
    "status",
    "arquivo",
    "data_emissao",
    "numero_nfe",
    "emitente_nome",
    "emitente_cnpj",
    "destinatario_nome",
    "forma_pagamento",
    "codigo_produto",
    "descricao_produto",
    "ncm",
    "quantidade",
    "valor_unitario",
    "valor_total_produto",
    "valor_total_nota",
];

/// Label placed in the item-total column of the summary record
pub const GRAND_TOTAL_LABEL: &str = "TOTAL GERAL DAS NOTAS:";

const ITEM_TOTAL_COLUMN: usize = 13;
const INVOICE_TOTAL_COLUMN: usize = 14;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rows accumulated over a run
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    rows: Vec<InvoiceRow>,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one invoice
    pub fn extend(&mut self, rows: impl IntoIterator<Item = InvoiceRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of distinct source files represented
    pub fn invoice_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.filename.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn grand_total(&self) -> Money {
        compute_grand_total(&self.rows)
    }
}

/// Sum of invoice totals, once per file, authorized invoices only
///
/// Totals that do not parse as a number are skipped.
pub fn compute_grand_total(rows: &[InvoiceRow]) -> Money {
    let mut counted: HashSet<&str> = HashSet::new();
    let mut total = Money::zero();

    for row in rows {
        if !row.is_authorized() || counted.contains(row.filename.as_str()) {
            continue;
        }
        let Some(amount) = row.invoice_total_amount() else {
            continue;
        };
        match total.checked_add(amount) {
            Some(sum) => {
                total = sum;
                counted.insert(row.filename.as_str());
            }
            None => warn!(file = %row.filename, "Invoice total overflows the grand total; skipped"),
        }
    }

    total
}

fn row_record(row: &InvoiceRow) -> [&str; 15] {
    [
        row.status.label(),
        &row.filename,
        &row.issued_at,
        &row.number,
        &row.issuer_name,
        &row.issuer_tax_id,
        &row.recipient_name,
        row.payment.label(),
        &row.item_code,
        &row.item_description,
        &row.item_ncm,
        &row.quantity,
        &row.unit_price,
        &row.item_total,
        &row.invoice_total,
    ]
}

/// Write the report for `rows` with a precomputed grand total
pub fn write_report_csv<W: Write>(
    rows: &[InvoiceRow],
    grand_total: Money,
    writer: &mut W,
) -> NfeResult<()> {
    writer
        .write_all(UTF8_BOM)
        .map_err(|e| NfeError::Export(e.to_string()))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(REPORT_HEADER)?;
    for row in rows {
        csv_writer.write_record(row_record(row))?;
    }

    csv_writer.write_record([""; 15])?;

    let total_text = grand_total.to_decimal_comma();
    let mut summary = [""; 15];
    summary[ITEM_TOTAL_COLUMN] = GRAND_TOTAL_LABEL;
    summary[INVOICE_TOTAL_COLUMN] = &total_text;
    csv_writer.write_record(summary)?;

    csv_writer
        .flush()
        .map_err(|e| NfeError::Export(e.to_string()))?;
    Ok(())
}

/// Outcome of saving a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The report was written to this path
    Saved(PathBuf),
    /// There were no rows; no file was created
    NothingToSave,
}

/// Save a report to `path`
///
/// An empty report writes nothing and returns `SaveOutcome::NothingToSave`.
pub fn save_report(
    path: &Path,
    report: &AggregateReport,
    log: LogFn<'_>,
) -> NfeResult<SaveOutcome> {
    if report.is_empty() {
        info!("No invoice data to save in the summary report");
        emit(log, "No invoice data to save in the summary report.");
        return Ok(SaveOutcome::NothingToSave);
    }

    let file = File::create(path).map_err(|e| {
        NfeError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);

    write_report_csv(report.rows(), report.grand_total(), &mut writer)?;
    writer
        .flush()
        .map_err(|e| NfeError::Export(format!("Failed to flush {}: {}", path.display(), e)))?;

    info!(path = %path.display(), rows = report.len(), "Detailed summary saved");
    emit(log, &format!("Detailed summary saved to: {}", path.display()));
    Ok(SaveOutcome::Saved(path.to_path_buf()))
}
