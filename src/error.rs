//! Error types for the bridge.
//!
//! Errors are categorized by where they surface and whether the Source
//! should retry the request that produced them.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `TooManyConcurrentRequests` | Yes | Admission gate rejected the request (maps to 503) |
//! | `Index` | No | Fatal index failure: transport error, fatal bulk item, write not acknowledged |
//! | `RetriesExhausted` | No | Bulk retry budget spent with failures still present |
//! | `Unsupported` | No | Operation the bridge refuses by design (index create/delete, attachments) |
//! | `UuidReconcile` | No | Could not read or create a bucket UUID after the bounded retry loop |
//!
//! # Retry Behavior
//!
//! Use [`BridgeError::is_retryable()`] to decide whether the Source should
//! back off and resend. Only admission rejections are retryable; every other
//! variant means the request must not be blindly replayed. Transient
//! index-side rejections never surface here — the bulk engine retries them
//! internally.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by the bridge core.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The admission gate is at capacity.
    ///
    /// Surfaced to the Source as 503 so it backs off and retries.
    #[error("too many concurrent requests")]
    TooManyConcurrentRequests,

    /// Fatal index failure.
    ///
    /// Covers transport errors, bulk item failures outside the transient
    /// class, and writes the index did not acknowledge. Not retryable —
    /// the batch must not be re-acknowledged without operator attention.
    #[error("index error ({operation}): {message}")]
    Index { operation: String, message: String },

    /// Bulk indexing still failing after the configured retry budget.
    #[error("bulk indexing failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u64, message: String },

    /// Operation the bridge refuses by design.
    ///
    /// Distinct from transient failures so the Source does not keep
    /// retrying something that will never succeed.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// Bucket UUID could not be read or created.
    ///
    /// Either the index does not exist or the create/re-read loop exhausted
    /// its tries without converging on a value.
    #[error("failed to find or create bucket uuid for index {index}")]
    UuidReconcile { index: String },
}

impl BridgeError {
    /// Create a fatal index error.
    pub fn index(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Index {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Check if the Source should retry the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TooManyConcurrentRequests => true,
            Self::Index { .. } => false,
            Self::RetriesExhausted { .. } => false,
            Self::Unsupported(_) => false,
            Self::UuidReconcile { .. } => false,
        }
    }
}
