//! Resource declaration errors.
//!
//! Defines [`ResourceError`], raised while declaring buckets, policy
//! statements, and trails. Everything here is detected at definition time;
//! failures the provisioning engine reports at deploy time never surface
//! through this type.

/// Error raised when a resource declaration is structurally invalid.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The specified bucket name is not valid.
    #[error("Invalid bucket name: {name}: {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    /// A tag key or value, or the tag set as a whole, is invalid.
    #[error("Invalid tag: {message}")]
    InvalidTag {
        /// Description of the violation.
        message: String,
    },

    /// Auto-deleting objects was requested on a bucket that outlives teardown.
    #[error(
        "Cannot auto-delete objects of bucket {construct_id} without the Destroy removal policy"
    )]
    AutoDeleteRequiresDestroy {
        /// Construct id of the bucket.
        construct_id: String,
    },

    /// A policy statement without any action.
    #[error("A policy statement must specify at least one action")]
    EmptyActions,

    /// A resource-policy statement without any principal.
    #[error("A resource policy statement must specify at least one principal")]
    EmptyPrincipals,

    /// A resource-policy statement without any resource.
    #[error("A resource policy statement must specify at least one resource")]
    EmptyResources,

    /// A constructed grant never made it into the bucket policy.
    #[error("Policy statement granting {actions} was never attached to bucket {construct_id}")]
    UnattachedGrant {
        /// Construct id of the bucket that should carry the grant.
        construct_id: String,
        /// Comma-separated actions of the missing statement.
        actions: String,
    },

    /// A trail would audit writes into its own destination bucket.
    #[error("Trail {trail} must not select data events from its own destination bucket {bucket}")]
    SelfAuditingTrail {
        /// Construct id of the trail.
        trail: String,
        /// Construct id of the destination bucket.
        bucket: String,
    },

    /// Log retention outside the values CloudWatch Logs accepts.
    #[error("Unsupported log retention of {days} days")]
    InvalidLogRetention {
        /// The rejected retention.
        days: u32,
    },
}
