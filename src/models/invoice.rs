//! Invoice line-item rows
//!
//! One `InvoiceRow` is produced per line item of an invoice. Rows of the same
//! invoice repeat every invoice-level field, so a report has one line per item.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Money;

/// Placeholder for missing text fields
pub const MISSING_TEXT: &str = "N/A";
/// Placeholder for a missing quantity
pub const MISSING_QUANTITY: &str = "0";
/// Placeholder for missing monetary fields
pub const MISSING_AMOUNT: &str = "0.00";

/// Whether an invoice is still valid or was voided by a cancellation event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    #[default]
    Authorized,
    Canceled,
}

impl InvoiceStatus {
    /// Label written to the report
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authorized => "Autorizada",
            Self::Canceled => "Cancelada",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment method, from the `tPag` code of the first payment detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    Cash,
    Check,
    CreditCard,
    DebitCard,
    StoreCredit,
    FoodVoucher,
    MealVoucher,
    BankSlip,
    BankDeposit,
    InstantTransfer,
    NoPayment,
    #[default]
    Other,
}

impl PaymentMethod {
    /// Resolve a `tPag` code; unknown codes map to `Other`
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "01" => Self::Cash,
            "02" => Self::Check,
            "03" => Self::CreditCard,
            "04" => Self::DebitCard,
            "05" => Self::StoreCredit,
            "10" => Self::FoodVoucher,
            "11" => Self::MealVoucher,
            "15" => Self::BankSlip,
            "16" => Self::BankDeposit,
            "17" => Self::InstantTransfer,
            "90" => Self::NoPayment,
            _ => Self::Other,
        }
    }

    /// Label written to the report
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Dinheiro",
            Self::Check => "Cheque",
            Self::CreditCard => "Cartão de Crédito",
            Self::DebitCard => "Cartão de Débito",
            Self::StoreCredit => "Crédito Loja",
            Self::FoodVoucher => "Vale Alimentação",
            Self::MealVoucher => "Vale Refeição",
            Self::BankSlip => "Boleto Bancário",
            Self::BankDeposit => "Depósito Bancário",
            Self::InstantTransfer => "PIX",
            Self::NoPayment => "Sem Pagamento",
            Self::Other => "Outros",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One report line: invoice-level fields merged with one item's fields
///
/// Values are kept as the document's text so the report reproduces them
/// verbatim; `invoice_total_amount` parses the total when summing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    /// Source file name (no directory)
    pub filename: String,
    /// Issue timestamp (`dhEmi`)
    pub issued_at: String,
    /// Invoice number (`nNF`)
    pub number: String,
    pub issuer_name: String,
    /// Issuer CNPJ, or CPF for individuals
    pub issuer_tax_id: String,
    pub recipient_name: String,
    pub payment: PaymentMethod,
    pub status: InvoiceStatus,
    pub item_code: String,
    pub item_description: String,
    /// Mercosur tax classification (NCM)
    pub item_ncm: String,
    pub quantity: String,
    pub unit_price: String,
    pub item_total: String,
    /// Invoice grand total (`vNF`), repeated on every item row
    pub invoice_total: String,
}

impl InvoiceRow {
    /// Parsed invoice total, `None` when the text is not a number
    pub fn invoice_total_amount(&self) -> Option<Money> {
        Money::parse(&self.invoice_total).ok()
    }

    pub fn is_authorized(&self) -> bool {
        self.status == InvoiceStatus::Authorized
    }

    /// True when both rows carry the same invoice-level values
    pub fn same_invoice_as(&self, other: &InvoiceRow) -> bool {
        self.filename == other.filename
            && self.issued_at == other.issued_at
            && self.number == other.number
            && self.issuer_name == other.issuer_name
            && self.issuer_tax_id == other.issuer_tax_id
            && self.recipient_name == other.recipient_name
            && self.payment == other.payment
            && self.status == other.status
            && self.invoice_total == other.invoice_total
    }
}
