//! nfe-backup - Monthly backup and reporting of NFe fiscal documents
//!
//! This library selects the electronic invoice (NFe) XML documents issued in a
//! reference month, by the period encoded in each document's access key,
//! marks invoices voided by cancellation events, and produces a per-item CSV
//! report with a grand total. A run also copies and compresses the selected
//! documents and can upload the results with `rclone`.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings, paths and the immutable per-run configuration
//! - `error`: Custom error types
//! - `models`: Access keys, reference months, money and report rows
//! - `nfe`: Key extraction, month matching, cancellation scan, selection and
//!   invoice parsing
//! - `export`: CSV report writing
//! - `services`: The run pipeline, archive, upload, progress and run history
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use nfe_backup::models::ReferenceMonth;
//! use nfe_backup::nfe::{find_canceled_keys, select_files_for_month};
//!
//! let month = ReferenceMonth::new(2024, 1)?;
//! let canceled = find_canceled_keys(root, None);
//! let files = select_files_for_month(root, month, None)?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod nfe;
pub mod services;

pub use error::{NfeError, NfeResult};
