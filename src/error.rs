//! Error types for Postboard
//!
//! Store adapters fail with `StoreError`. The pipelines wrap it into
//! `AppError`, which tells the caller which step failed.

use thiserror::Error;

/// Failure reported by an external store (relational or object storage)
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record did not have the expected shape
    #[error("Malformed record: {0}")]
    Schema(String),
}

/// Application-wide error type
///
/// Every variant is surfaced unchanged to the immediate caller.
/// Nothing here is retried or compensated.
#[derive(Debug, Error)]
pub enum AppError {
    /// No active session when creating a post
    #[error("Authentication required")]
    Unauthorized,

    /// One file of an attachment batch failed to upload.
    ///
    /// Files uploaded earlier in the same batch stay in object storage.
    #[error("Upload of attachment #{index} ({name}) failed: {source}")]
    Upload {
        /// Position of the failing file in the batch
        index: usize,
        /// Original file name
        name: String,
        #[source]
        source: StoreError,
    },

    /// The post record could not be inserted after all uploads succeeded
    #[error("Post insert failed: {0}")]
    Insert(#[source] StoreError),

    /// The post list could not be read
    #[error("Post query failed: {0}")]
    Query(#[source] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable label for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Upload { .. } => "upload",
            AppError::Insert(_) => "insert",
            AppError::Query(_) => "query",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Record this error in the `errors_total` metric
    pub(crate) fn record(self, operation: &str) -> Self {
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL
            .with_label_values(&[self.kind(), operation])
            .inc();
        self
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
