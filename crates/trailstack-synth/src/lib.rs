//! Stack construction and template synthesis.
//!
//! A [`Stack`] collects resource declarations under construct ids, assigns
//! each a deterministic logical id, and renders them into a [`Template`].
//! [`AuditTrailStack`] is the concrete stack: a data bucket audited by a
//! CloudTrail trail that delivers into a private trail bucket.

pub mod audit;
pub mod error;
pub mod logical_id;
pub mod stack;
pub mod template;

pub use audit::{AuditTrailStack, cloudtrail_delivery_grants};
pub use error::{SynthError, SynthResult};
pub use logical_id::ConstructPath;
pub use stack::{AUTO_DELETE_PROVIDER_ID, BucketRef, S3Source, Stack, StackProps, TrailRef};
pub use template::Template;
