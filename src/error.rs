//! Custom error types for nfe-backup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::Path;

use thiserror::Error;

/// The main error type for nfe-backup operations
#[derive(Error, Debug)]
pub enum NfeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for keys, months and settings
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single document could not be read or decoded
    #[error("Failed to read {path}: {reason}")]
    Extraction { path: String, reason: String },

    /// A document is XML but not an invoice shape we recognize
    #[error("Unrecognized document structure: {0}")]
    UnrecognizedDocument(String),

    /// XML syntax errors
    #[error("XML error: {0}")]
    Xml(String),

    /// The source directory itself cannot be enumerated
    #[error("Cannot read source directory {path}: {reason}")]
    SourceDirectory { path: String, reason: String },

    /// Run prerequisites are not met
    #[error("Prerequisites not met: {}", .0.join("; "))]
    Prerequisites(Vec<String>),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Copy or compression errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Upload collaborator errors
    #[error("Upload error: {0}")]
    Upload(String),

    /// The background worker stopped unexpectedly
    #[error("Worker error: {0}")]
    Worker(String),
}

impl NfeError {
    /// Create an extraction error for a document path
    pub fn extraction(path: &Path, reason: impl ToString) -> Self {
        Self::Extraction {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a fatal source directory error
    pub fn source_directory(path: &Path, reason: impl ToString) -> Self {
        Self::SourceDirectory {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error only affects a single file
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            Self::Extraction { .. } | Self::UnrecognizedDocument(_) | Self::Xml(_)
        )
    }

    /// Check if this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceDirectory { .. } | Self::Prerequisites(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for NfeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NfeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for NfeError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl From<quick_xml::Error> for NfeError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<walkdir::Error> for NfeError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<zip::result::ZipError> for NfeError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type alias for nfe-backup operations
pub type NfeResult<T> = Result<T, NfeError>;
