//! Error types for filter parsing, evaluation and translation.
//!
//! Errors fall into two groups. Client errors (malformed paths or filters, and
//! ordering comparisons against boolean or binary values) are caused by the
//! request and map to HTTP 400 with a SCIM `scimType`. Server errors (an
//! inconsistent translator configuration, or an unexpected evaluator failure)
//! indicate a bug on the server side and map to HTTP 500.

use crate::filter::Operator;
use serde_json::{Value, json};

/// SCIM error message schema URI (RFC 7644 §3.12).
pub const ERROR_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// Main error type for filter operations.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// An attribute path expression could not be parsed
    #[error("Invalid path: {message}")]
    InvalidPath {
        message: String,
        offset: Option<usize>,
    },

    /// A filter expression could not be parsed
    #[error("Invalid filter: {message}")]
    InvalidFilter {
        message: String,
        offset: Option<usize>,
    },

    /// An ordering operator was applied to a value that has no ordering
    #[error("Invalid value type for '{operator}' on '{path}': {found} values cannot be ordered")]
    InvalidValueType {
        operator: Operator,
        path: String,
        found: &'static str,
    },

    /// A translator handler behaved differently across calls for the same predicate
    #[error("Inconsistent translator method '{method}': {detail}")]
    InconsistentTranslator { method: String, detail: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convenience methods for creating common errors
impl FilterError {
    /// Create an invalid path error
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
            offset: None,
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
            offset: None,
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an inconsistent translator error naming the offending method
    pub fn inconsistent(method: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InconsistentTranslator {
            method: method.into(),
            detail: detail.into(),
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::InvalidFilter { .. }
                | Self::InvalidValueType { .. }
                | Self::Json(_)
        )
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    /// SCIM `scimType` detail keyword, for client errors.
    pub fn scim_type(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPath { .. } => Some("invalidPath"),
            Self::InvalidFilter { .. } | Self::InvalidValueType { .. } => Some("invalidFilter"),
            Self::Json(_) => Some("invalidSyntax"),
            Self::InconsistentTranslator { .. } | Self::Internal { .. } => None,
        }
    }

    /// Render the error as an RFC 7644 error response body.
    pub fn to_scim_response(&self) -> Value {
        let mut body = json!({
            "schemas": [ERROR_SCHEMA],
            "status": self.status().to_string(),
            "detail": self.to_string(),
        });
        if let Some(scim_type) = self.scim_type() {
            body["scimType"] = Value::String(scim_type.to_string());
        }
        body
    }

    /// Attach a byte offset to a parse error.
    pub(crate) fn at(self, position: usize) -> Self {
        match self {
            Self::InvalidPath { message, .. } => Self::InvalidPath {
                message,
                offset: Some(position),
            },
            Self::InvalidFilter { message, .. } => Self::InvalidFilter {
                message,
                offset: Some(position),
            },
            other => other,
        }
    }
}

/// Errors raised by the in-memory document store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A writer panicked while holding the storage lock
    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// Stored resources must be JSON objects
    #[error("Cannot store a {found} document, expected an object")]
    InvalidDocument { found: &'static str },

    /// The search filter could not be translated or evaluated
    #[error(transparent)]
    Filter(#[from] FilterError),
}

// Result type aliases for convenience
pub type FilterResult<T> = Result<T, FilterError>;
pub type StorageResult<T> = Result<T, StorageError>;
