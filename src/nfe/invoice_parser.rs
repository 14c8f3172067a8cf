//! Invoice document extraction
//!
//! Streams the document with quick-xml, tracking the element path by local
//! name so namespace prefixes never matter. Two document shapes are
//! recognized: the `nfeProc` processing envelope and a bare `NFe` root.
//! Everything the report needs lives under `infNFe`.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use super::{emit, file_name, LogFn};
use crate::error::{NfeError, NfeResult};
use crate::models::invoice::{MISSING_AMOUNT, MISSING_QUANTITY, MISSING_TEXT};
use crate::models::{CanceledKeySet, InvoiceRow, InvoiceStatus, PaymentMethod};

/// Element paths leading to `infNFe`
const INVOICE_SHAPES: [&[&str]; 2] = [&["nfeProc", "NFe", "infNFe"], &["NFe", "infNFe"]];

/// Payment code used when the document has none
const DEFAULT_PAYMENT_CODE: &str = "99";

#[derive(Debug, Default)]
struct ParsedItem {
    code: Option<String>,
    description: Option<String>,
    ncm: Option<String>,
    quantity: Option<String>,
    unit_price: Option<String>,
    total: Option<String>,
}

#[derive(Debug, Default)]
struct ParsedInvoice {
    recognized: bool,
    key: Option<String>,
    issued_at: Option<String>,
    number: Option<String>,
    issuer_name: Option<String>,
    issuer_cnpj: Option<String>,
    issuer_cpf: Option<String>,
    recipient_name: Option<String>,
    invoice_total: Option<String>,
    payment_details_seen: usize,
    payment_code: Option<String>,
    items: Vec<ParsedItem>,
    current_item: Option<ParsedItem>,
}

/// Path below `infNFe`, or `None` outside a recognized invoice
fn invoice_relative(path: &[String]) -> Option<&[String]> {
    INVOICE_SHAPES.iter().find_map(|shape| {
        let matches = path.len() >= shape.len()
            && path.iter().zip(shape.iter()).all(|(a, b)| a == b);
        matches.then(|| &path[shape.len()..])
    })
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn append(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

impl ParsedInvoice {
    fn handle_start(&mut self, path: &[String], e: &BytesStart<'_>) {
        let Some(rel) = invoice_relative(path) else {
            return;
        };
        let rel: Vec<&str> = rel.iter().map(String::as_str).collect();

        match rel.as_slice() {
            [] => {
                self.recognized = true;
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"Id" {
                        let id = String::from_utf8_lossy(&attr.value).into_owned();
                        self.key = Some(id.replace("NFe", ""));
                    }
                }
            }
            ["det"] => self.current_item = Some(ParsedItem::default()),
            ["pag", "detPag"] => self.payment_details_seen += 1,
            _ => {}
        }
    }

    fn handle_end(&mut self, path: &[String]) {
        let Some(rel) = invoice_relative(path) else {
            return;
        };
        if rel.len() == 1 && rel[0] == "det" {
            if let Some(item) = self.current_item.take() {
                self.items.push(item);
            }
        }
    }

    fn handle_text(&mut self, path: &[String], text: &str) {
        let Some(rel) = invoice_relative(path) else {
            return;
        };
        let rel: Vec<&str> = rel.iter().map(String::as_str).collect();

        match rel.as_slice() {
            ["ide", "dhEmi"] => append(&mut self.issued_at, text),
            // Layouts before 3.10 only carry the date
            ["ide", "dEmi"] if self.issued_at.is_none() => append(&mut self.issued_at, text),
            ["ide", "nNF"] => append(&mut self.number, text),
            ["emit", "xNome"] => append(&mut self.issuer_name, text),
            ["emit", "CNPJ"] => append(&mut self.issuer_cnpj, text),
            ["emit", "CPF"] => append(&mut self.issuer_cpf, text),
            ["dest", "xNome"] => append(&mut self.recipient_name, text),
            ["total", "ICMSTot", "vNF"] => append(&mut self.invoice_total, text),
            ["pag", "detPag", "tPag"] if self.payment_details_seen == 1 => {
                append(&mut self.payment_code, text)
            }
            ["pag", "tPag"] if self.payment_code.is_none() => append(&mut self.payment_code, text),
            ["det", "prod", field] => {
                let Some(item) = self.current_item.as_mut() else {
                    return;
                };
                let slot = match *field {
                    "cProd" => &mut item.code,
                    "xProd" => &mut item.description,
                    "NCM" => &mut item.ncm,
                    "qCom" => &mut item.quantity,
                    "vUnCom" => &mut item.unit_price,
                    "vProd" => &mut item.total,
                    _ => return,
                };
                append(slot, text);
            }
            _ => {}
        }
    }

    fn into_rows(self, filename: &str, canceled: &CanceledKeySet) -> Vec<InvoiceRow> {
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING_TEXT.to_string());
        let amount =
            |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING_AMOUNT.to_string());

        let status = match &self.key {
            Some(key) if canceled.contains(key) => InvoiceStatus::Canceled,
            _ => InvoiceStatus::Authorized,
        };
        let payment = PaymentMethod::from_code(
            self.payment_code.as_deref().unwrap_or(DEFAULT_PAYMENT_CODE),
        );

        let issued_at = text(&self.issued_at);
        let number = text(&self.number);
        let issuer_name = text(&self.issuer_name);
        let issuer_tax_id = self
            .issuer_cnpj
            .clone()
            .or_else(|| self.issuer_cpf.clone())
            .unwrap_or_else(|| MISSING_TEXT.to_string());
        let recipient_name = text(&self.recipient_name);
        let invoice_total = amount(&self.invoice_total);

        self.items
            .iter()
            .map(|item| InvoiceRow {
                filename: filename.to_string(),
                issued_at: issued_at.clone(),
                number: number.clone(),
                issuer_name: issuer_name.clone(),
                issuer_tax_id: issuer_tax_id.clone(),
                recipient_name: recipient_name.clone(),
                payment,
                status,
                item_code: text(&item.code),
                item_description: text(&item.description),
                item_ncm: text(&item.ncm),
                quantity: item
                    .quantity
                    .clone()
                    .unwrap_or_else(|| MISSING_QUANTITY.to_string()),
                unit_price: amount(&item.unit_price),
                item_total: amount(&item.total),
                invoice_total: invoice_total.clone(),
            })
            .collect()
    }
}

/// Parse invoice document text into one row per line item
///
/// # Errors
///
/// `NfeError::Xml` for malformed XML and `NfeError::UnrecognizedDocument`
/// when neither invoice shape is present. Missing fields never fail; they
/// fall back to placeholders.
pub fn parse_invoice_document(
    filename: &str,
    xml: &str,
    canceled: &CanceledKeySet,
) -> NfeResult<Vec<InvoiceRow>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut invoice = ParsedInvoice::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                path.push(local_name(e));
                invoice.handle_start(&path, e);
            }
            Event::Empty(ref e) => {
                path.push(local_name(e));
                invoice.handle_start(&path, e);
                invoice.handle_end(&path);
                path.pop();
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                if !text.is_empty() {
                    invoice.handle_text(&path, &text);
                }
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e);
                invoice.handle_text(&path, text.trim());
            }
            Event::End(_) => {
                invoice.handle_end(&path);
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !invoice.recognized {
        return Err(NfeError::UnrecognizedDocument(filename.to_string()));
    }

    Ok(invoice.into_rows(filename, canceled))
}

/// Extract the rows of one invoice file
///
/// Never fails: unreadable, malformed and unrecognized documents are logged
/// and yield no rows.
pub fn extract_invoice_rows(
    path: &Path,
    canceled: &CanceledKeySet,
    log: LogFn<'_>,
) -> Vec<InvoiceRow> {
    let filename = file_name(path);

    let xml = match std::fs::read_to_string(path) {
        Ok(xml) => xml,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "Cannot read invoice");
            emit(log, &format!("ERROR processing XML file {}: {}", filename, err));
            return Vec::new();
        }
    };

    match parse_invoice_document(&filename, &xml, canceled) {
        Ok(rows) => {
            debug!(file = %filename, rows = rows.len(), "Extracted invoice rows");
            rows
        }
        Err(NfeError::UnrecognizedDocument(_)) => {
            warn!(file = %filename, "XML structure not recognized");
            emit(
                log,
                &format!("WARNING: XML structure not recognized in {}", filename),
            );
            Vec::new()
        }
        Err(err) => {
            warn!(file = %filename, error = %err, "Cannot parse invoice");
            emit(log, &format!("ERROR processing XML file {}: {}", filename, err));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfe::fixtures::{cancellation_xml, invoice_xml, KEY_2401, KEY_2402};
    use tempfile::TempDir;

    const THREE_ITEMS: [(&str, &str, &str); 3] = [
        ("001", "Cafe 500g", "10.00"),
        ("002", "Acucar 1kg", "5.50"),
        ("003", "Leite 1L", "4.50"),
    ];

    #[test]
    fn test_one_row_per_item() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS, "20.00");
        let rows = parse_invoice_document("nota.xml", &xml, &CanceledKeySet::new()).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.same_invoice_as(&rows[0])));
        assert_eq!(rows[0].item_code, "001");
        assert_eq!(rows[1].item_description, "Acucar 1kg");
        assert_eq!(rows[2].item_total, "4.50");

        let first = &rows[0];
        assert_eq!(first.filename, "nota.xml");
        assert_eq!(first.issued_at, "2024-01-15T10:30:00-03:00");
        assert_eq!(first.number, "1234");
        assert_eq!(first.issuer_name, "Loja Exemplo LTDA");
        assert_eq!(first.issuer_tax_id, "12345678000199");
        assert_eq!(first.recipient_name, "Cliente Final");
        assert_eq!(first.payment, PaymentMethod::CreditCard);
        assert_eq!(first.status, InvoiceStatus::Authorized);
        assert_eq!(first.item_ncm, "21069090");
        assert_eq!(first.quantity, "1.0000");
        assert_eq!(first.invoice_total, "20.00");
    }

    #[test]
    fn test_single_item_document() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS[..1], "10.00");
        let rows = parse_invoice_document("nota.xml", &xml, &CanceledKeySet::new()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_bare_nfe_root() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS[..2], "15.50");
        let start = xml.find("<NFe ").unwrap();
        let end = xml.find("</nfeProc>").unwrap();
        let bare = &xml[start..end];

        let rows = parse_invoice_document("bare.xml", bare, &CanceledKeySet::new()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].invoice_total, "15.50");
    }

    #[test]
    fn test_canceled_status() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS, "20.00");
        let canceled: CanceledKeySet = [KEY_2401.to_string()].into_iter().collect();
        let rows = parse_invoice_document("nota.xml", &xml, &canceled).unwrap();
        assert!(rows.iter().all(|r| r.status == InvoiceStatus::Canceled));

        let other: CanceledKeySet = [KEY_2402.to_string()].into_iter().collect();
        let rows = parse_invoice_document("nota.xml", &xml, &other).unwrap();
        assert!(rows.iter().all(|r| r.status == InvoiceStatus::Authorized));
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let xml = r#"<NFe><infNFe Id="NFe35240112345678000199550010000012341123456780">
            <det nItem="1"><prod><xProd>Sem codigo</xProd></prod></det>
        </infNFe></NFe>"#;
        let rows = parse_invoice_document("min.xml", xml, &CanceledKeySet::new()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.issued_at, "N/A");
        assert_eq!(row.number, "N/A");
        assert_eq!(row.issuer_name, "N/A");
        assert_eq!(row.issuer_tax_id, "N/A");
        assert_eq!(row.recipient_name, "N/A");
        assert_eq!(row.item_code, "N/A");
        assert_eq!(row.item_description, "Sem codigo");
        assert_eq!(row.quantity, "0");
        assert_eq!(row.unit_price, "0.00");
        assert_eq!(row.item_total, "0.00");
        assert_eq!(row.invoice_total, "0.00");
        assert_eq!(row.payment, PaymentMethod::Other);
    }

    #[test]
    fn test_first_payment_detail_wins() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS[..1], "10.00").replace(
            "<pag><detPag><tPag>03</tPag>",
            "<pag><detPag><tPag>17</tPag><vPag>5.00</vPag></detPag><detPag><tPag>01</tPag>",
        );
        let rows = parse_invoice_document("nota.xml", &xml, &CanceledKeySet::new()).unwrap();
        assert_eq!(rows[0].payment, PaymentMethod::InstantTransfer);
    }

    #[test]
    fn test_issuer_cpf_fallback() {
        let xml = invoice_xml(KEY_2401, &THREE_ITEMS[..1], "10.00")
            .replace("<CNPJ>12345678000199</CNPJ>", "<CPF>12345678909</CPF>");
        let rows = parse_invoice_document("nota.xml", &xml, &CanceledKeySet::new()).unwrap();
        assert_eq!(rows[0].issuer_tax_id, "12345678909");
    }

    #[test]
    fn test_escaped_text() {
        let xml = invoice_xml(KEY_2401, &[("1", "Arroz &amp; Feijao", "3.00")], "3.00");
        let rows = parse_invoice_document("nota.xml", &xml, &CanceledKeySet::new()).unwrap();
        assert_eq!(rows[0].item_description, "Arroz & Feijao");
    }

    #[test]
    fn test_event_document_is_unrecognized() {
        let result =
            parse_invoice_document("canc.xml", &cancellation_xml(KEY_2401), &CanceledKeySet::new());
        assert!(matches!(result, Err(NfeError::UnrecognizedDocument(_))));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = parse_invoice_document(
            "bad.xml",
            "<NFe><infNFe></NFe>",
            &CanceledKeySet::new(),
        );
        assert!(matches!(result, Err(NfeError::Xml(_))));
    }

    #[test]
    fn test_extract_from_file_never_fails() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.xml");
        let event = temp_dir.path().join("event.xml");
        let bad = temp_dir.path().join("bad.xml");
        std::fs::write(&good, invoice_xml(KEY_2401, &THREE_ITEMS, "20.00")).unwrap();
        std::fs::write(&event, cancellation_xml(KEY_2402)).unwrap();
        std::fs::write(&bad, "<NFe><infNFe>").unwrap();

        let canceled = CanceledKeySet::new();
        assert_eq!(extract_invoice_rows(&good, &canceled, None).len(), 3);
        assert!(extract_invoice_rows(&event, &canceled, None).is_empty());
        assert!(extract_invoice_rows(&bad, &canceled, None).is_empty());
        assert!(extract_invoice_rows(&temp_dir.path().join("none.xml"), &canceled, None).is_empty());
    }
}
