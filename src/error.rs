//! Error types for document loading and parsing.
//!
//! Compatibility findings are never represented here; they travel inside a
//! [`crate::ValidationOutcome`]. `ParseError` covers the structural tier:
//! unreadable input and documents that lack the shape the normalizers need.

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures that abort a validation run before any checking happens.
#[derive(Debug, Error)]
pub enum ParseError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("unable to parse \"{source_name}\" as json or yaml: {message}")]
    UnparseableDocument { source_name: String, message: String },

    #[error("\"{source_name}\" is not a valid spec document: {message}")]
    InvalidSpecDocument { source_name: String, message: String },

    #[error("\"{source_name}\" is not a valid mock document: {message}")]
    InvalidMockDocument { source_name: String, message: String },
}

impl ParseError {
    /// Stable machine-readable kind for downstream tooling.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::FileNotFound { .. } | ParseError::ReadError { .. } => "READ_ERROR",
            #[cfg(feature = "remote")]
            ParseError::NetworkError { .. } => "READ_ERROR",
            _ => "PARSE_ERROR",
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            "READ_ERROR" => 3,
            _ => 2,
        }
    }
}
