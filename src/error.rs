//! Error types for the component catalog
//!
//! Only a few of these ever escape a batch run. Per-file parse failures,
//! non-component files, unresolved style tokens and broken theme configs are
//! contained as warnings in the build report; a snapshot with an incompatible
//! `formatVersion` is the one hard failure callers have to handle.

use std::process::ExitCode;

use thiserror::Error;

/// Errors surfaced by the catalog library and binary
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Failed to parse source: {message}")]
    ParseFailure { message: String },

    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    FormatVersion { found: String, expected: String },

    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Process exit code used by the binary for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(2),
            Self::UnsupportedLanguage { .. } | Self::ParseFailure { .. } => ExitCode::from(3),
            Self::FormatVersion { .. } | Self::InvalidSnapshot { .. } => ExitCode::from(4),
            Self::Config { .. } => ExitCode::from(5),
            Self::Io(_) | Self::Json(_) => ExitCode::FAILURE,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CatalogError>;
