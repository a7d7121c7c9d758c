//! Error types for content-check
//!
//! This module provides the error taxonomy for the library:
//! - Configuration errors (fatal for the whole run, surfaced before dispatch)
//! - Local per-item errors (missing/unreadable/oversized files)
//! - Remote errors split into transient (rate limit, server error, network)
//!   and non-transient (authentication, malformed request) classes
//!
//! Transient/non-transient classification lives in [`crate::retry::IsTransient`];
//! this module only defines the tagged variants that classification inspects.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for content-check operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for content-check
///
/// Each variant carries enough context (config key, HTTP status, file path)
/// to diagnose failures from logs alone.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_token")
        key: Option<String>,
    },

    /// I/O error (file reads, directory walks)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network-level error from the HTTP client (timeouts, connection failures)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote service rejected the request with 429 Too Many Requests
    #[error("rate limited by remote service: {0}")]
    RateLimited(String),

    /// Remote service returned a 5xx server error
    #[error("remote server error ({status}): {message}")]
    Server {
        /// The HTTP status code (500-599)
        status: u16,
        /// The response body or status text
        message: String,
    },

    /// Authentication or authorization failure (401/403, bad token)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-success response from the remote service
    #[error("remote service error ({status}): {message}")]
    Remote {
        /// The HTTP status code
        status: u16,
        /// The response body or status text
        message: String,
    },

    /// File exceeds the configured size cap for check submission
    #[error("file too large: {path} is {size} bytes (limit {limit})")]
    FileTooLarge {
        /// The file that exceeds the cap
        path: PathBuf,
        /// Actual file size in bytes
        size: u64,
        /// Configured maximum in bytes
        limit: u64,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Folder watching error
    #[error("folder watch error: {0}")]
    Watch(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
