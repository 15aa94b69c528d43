//! Unified error type hierarchy for AbuseWatch
//!
//! Provides structured error handling with ApiError for backend calls and
//! ConfigError for local configuration files.

use std::io;
use thiserror::Error;

/// Backend request errors.
///
/// A non-success HTTP status is always surfaced as `Status` carrying the
/// code and the response body text, never silently swallowed.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("API error {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Get a user-facing error message suitable for inline UI display.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { code, body } => {
                format!("Server rejected the request ({}): {}", code, body)
            }
            ApiError::Transport(msg) => format!("Could not reach the server: {}", msg),
            ApiError::Decode(msg) => format!("Unexpected server response: {}", msg),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level result type for operations that may fail.
/// Use this as the return type for all fallible functions.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
