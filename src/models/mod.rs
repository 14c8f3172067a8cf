//! Core data models for nfe-backup
//!
//! Access keys, reference months, money and the per-item invoice rows that
//! flow from extraction into the report.

pub mod access_key;
pub mod invoice;
pub mod money;
pub mod reference_month;

use std::collections::HashSet;

pub use access_key::{AccessKey, AccessKeyError, ACCESS_KEY_LEN};
pub use invoice::{InvoiceRow, InvoiceStatus, PaymentMethod};
pub use money::Money;
pub use reference_month::{MonthParseError, ReferenceMonth};

/// Access keys of invoices voided by a cancellation event
pub type CanceledKeySet = HashSet<String>;
