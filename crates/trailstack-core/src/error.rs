//! Error types for the trailstack core.

/// Core error type for trailstack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum TrailStackError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// Invalid stack identifier.
    #[error("invalid stack id: {id}: {reason}")]
    InvalidStackId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Convenience result type for trailstack core operations.
pub type TrailStackResult<T> = Result<T, TrailStackError>;
