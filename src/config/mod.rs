//! Configuration module for nfe-backup
//!
//! This module provides configuration management including:
//! - Settings and history path resolution
//! - User settings persistence
//! - Immutable per-run configuration

pub mod paths;
pub mod settings;

pub use paths::NfePaths;
pub use settings::{RunConfig, RunOverrides, Settings, UploadSettings};
