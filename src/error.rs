//! Error types for OData batch operations.
//!
//! This module defines every error that can occur while building, sending, and
//! demultiplexing a batch, or while cleaning up the entities a run created.
//! The [`Result`] type alias provides a convenient shorthand for fallible operations.
//!
//! # Error Categories
//!
//! | Category | Variants | Aborts the run |
//! |----------|----------|----------------|
//! | Transport | `Http`, `Timeout`, `Io` | Yes |
//! | Validation | `Validation` | Yes, before any network call |
//! | Remote protocol | `BatchRejected`, `VersionDiscovery`, `Multipart` | Yes |
//! | Cleanup | `Cleanup` | Reported last |
//! | Configuration | `Config`, `Url` | Yes |
//!
//! Per-operation failures inside an accepted batch are never errors. They surface
//! as [`Outcome::Failed`](crate::client::Outcome::Failed) and the caller inspects them.
//!
//! # Examples
//!
//! ```
//! use odata_batch_http::BatchError;
//!
//! let err = BatchError::Timeout;
//! assert!(err.is_transport());
//!
//! let err = BatchError::Validation("duplicate Content-ID 1".into());
//! assert!(!err.is_transport());
//! assert!(err.to_string().contains("Content-ID 1"));
//! ```

use crate::client::CleanupReport;
use std::io;
use thiserror::Error;

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that can occur during OData batch operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BatchError {
    /// HTTP request failed at the transport level (connection refused, TLS, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Network I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The outstanding request timed out.
    #[error("Operation timed out")]
    Timeout,

    /// The requested operations violate the batch contract.
    ///
    /// Raised by the builder before anything is sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server rejected the batch as a whole (non-2xx top-level status).
    #[error("Batch rejected with status {status}: {body}")]
    BatchRejected {
        /// Top-level HTTP status.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Version discovery failed; no batch work can be done in this session.
    #[error("Failed to retrieve the API version (status {status}): {body}")]
    VersionDiscovery {
        /// HTTP status of the `RetrieveVersion` call.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The top-level multipart envelope could not be read.
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// An embedded HTTP message could not be parsed.
    #[error("HTTP message parse error: {0}")]
    HttpMessage(String),

    /// One or more deletes failed during cleanup.
    ///
    /// Carries the full tally and the body of the last failed delete.
    #[error(
        "Cleanup failed: {} deleted, {} not found, {} failed; last failure: {body}",
        .report.deleted,
        .report.not_found,
        .report.failed
    )]
    Cleanup {
        /// Tally of every attempted delete.
        report: CleanupReport,
        /// Body of the last failing delete response.
        body: String,
    },

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid UTF-8 sequence where text was required.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BatchError::Timeout
        } else {
            BatchError::Http(err.to_string())
        }
    }
}

impl From<anyhow::Error> for BatchError {
    fn from(err: anyhow::Error) -> Self {
        BatchError::Http(format!("{:#}", err))
    }
}

impl BatchError {
    /// Check if this error came from the transport (connection, timeout, I/O).
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, BatchError::Http(_) | BatchError::Timeout | BatchError::Io(_))
    }

    /// Check if this error leaves the session unusable.
    ///
    /// Version discovery and configuration failures mean no resource path can be
    /// resolved, so no further batch should be attempted.
    #[inline]
    #[must_use]
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(
            self,
            BatchError::VersionDiscovery { .. } | BatchError::Config(_) | BatchError::Url(_)
        )
    }
}
