//! Stack construction and synthesis errors.

use trailstack_core::TrailStackError;
use trailstack_model::ResourceError;

/// Error raised while building or synthesizing a stack.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Two constructs share an id within the same stack.
    #[error("There is already a construct with id '{id}' in stack {stack}")]
    DuplicateConstructId {
        /// The colliding construct id.
        id: String,
        /// The stack id.
        stack: String,
    },

    /// Construct ids must be non-empty and must not contain the path separator.
    #[error("Invalid construct id '{id}': {reason}")]
    InvalidConstructId {
        /// The rejected construct id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two buckets declare the same physical name.
    #[error("Bucket name {name} is declared by both {first} and {second}")]
    DuplicateBucketName {
        /// The shared bucket name.
        name: String,
        /// Construct id of the first declaration.
        first: String,
        /// Construct id of the second declaration.
        second: String,
    },

    /// Two resources flattened to the same logical id.
    #[error("Logical id {0} is produced by more than one resource")]
    DuplicateLogicalId(String),

    /// A handle issued by another stack was used.
    #[error("{kind} handle does not belong to stack {stack}")]
    ForeignHandle {
        /// Kind of handle (`bucket`, `trail`).
        kind: &'static str,
        /// The stack id.
        stack: String,
    },

    /// Invalid resource declaration.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Invalid identifier or configuration.
    #[error(transparent)]
    Core(#[from] TrailStackError),

    /// Template serialization failure.
    #[error("failed to render template: {0}")]
    Render(#[from] serde_json::Error),
}

/// Convenience result type for stack operations.
pub type SynthResult<T> = Result<T, SynthError>;
