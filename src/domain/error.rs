//! Domain-level error types for syncgrid.
//!
//! All errors are typed with `thiserror` and provide meaningful context
//! without exposing internal details to end users.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The bookmark store rejected or failed a call.
    #[error("Bookmark store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A node id did not resolve in the bookmark store.
    #[error("Bookmark node not found: {id}")]
    NodeNotFound { id: String },

    /// The store refused an operation that would break the tree.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Invalid or corrupted data.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON serialization or parsing failed.
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An import document did not pass validation.
    #[error("Import rejected: {0}")]
    ImportRejected(#[from] ImportRejection),
}

impl AppError {
    /// Create a store error from a rusqlite error.
    pub fn store(err: rusqlite::Error) -> Self {
        Self::Store {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a JSON error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a not-found error for a node id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

/// Why an import document was refused.
///
/// Every variant is terminal: nothing from a rejected document reaches the
/// bookmark store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportRejection {
    #[error("input is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("not valid JSON: {0}")]
    Malformed(String),

    #[error("unexpected document shape: {0}")]
    Shape(&'static str),

    #[error("invalid folder structure: {0}")]
    Structure(&'static str),

    #[error("disallowed URL: {0}")]
    UnsafeUrl(String),

    #[error("checksum does not match content")]
    ChecksumMismatch,
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
