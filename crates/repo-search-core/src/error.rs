//! Error types for repo directory search.
//!
//! Structural failures (the directory store cannot be read, a cursor does
//! not decode) abort a search. Enrichment failures are reported by overlay
//! and enricher implementations as [`Error::EnrichmentDegraded`], but the
//! search engine never surfaces them to its caller.

use std::fmt;
use thiserror::Error;

/// The unified error type for repo search operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The directory store could not be reached or queried.
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A cursor did not decode, or belongs to another ordering mode.
    #[error("invalid cursor: {reason}")]
    InvalidCursor { reason: String },

    /// A moderation or related-record lookup failed for one repo.
    #[error("enrichment degraded: {message}")]
    EnrichmentDegraded { message: String },

    /// Protocol errors (XRPC errors, unexpected responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid DID, handle, NSID, URL format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Error::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        Error::InvalidCursor {
            reason: reason.into(),
        }
    }

    pub fn enrichment(message: impl Into<String>) -> Self {
        Error::EnrichmentDegraded {
            message: message.into(),
        }
    }

    /// Machine-readable error name, as returned in XRPC error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::StoreUnavailable { .. } => "StoreUnavailable",
            Error::InvalidCursor { .. } => "InvalidCursor",
            Error::EnrichmentDegraded { .. } => "EnrichmentDegraded",
            Error::Protocol(_) => "ProtocolError",
            Error::InvalidInput(_) => "InvalidRequest",
        }
    }
}

/// Protocol-level errors from XRPC responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// XRPC error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// True for 404 responses and the `RepoNotFound`/`RecordNotFound` codes.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
            || self.error.as_deref() == Some("RepoNotFound")
            || self.error.as_deref() == Some("RecordNotFound")
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    #[error("invalid DID '{value}': {reason}")]
    Did { value: String, reason: String },

    #[error("invalid handle '{value}': {reason}")]
    Handle { value: String, reason: String },

    #[error("invalid NSID '{value}': {reason}")]
    Nsid { value: String, reason: String },

    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },

    /// Record value is not an object with a string `$type`.
    #[error("invalid record value: {reason}")]
    RecordValue { reason: String },

    #[error("invalid config: {message}")]
    Config { message: String },

    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct_for_fatal_errors() {
        assert_eq!(Error::store_unavailable("down").kind(), "StoreUnavailable");
        assert_eq!(Error::invalid_cursor("bad").kind(), "InvalidCursor");
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::new(
            404,
            Some("RepoNotFound".to_string()),
            Some("no such repo".to_string()),
        );
        assert_eq!(err.to_string(), "HTTP 404 [RepoNotFound]: no such repo");
        assert!(err.is_not_found());
    }
}
