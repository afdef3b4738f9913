//! Typed resource declarations for trailstack.
//!
//! Each declaration validates its own attributes when created and renders
//! itself into CloudFormation [`Resource`] entries. Cross-resource wiring is
//! expressed through [`Value`] intrinsics that the provisioning engine
//! resolves at deploy time.

pub mod auto_delete;
pub mod bucket;
pub mod error;
pub mod policy;
pub mod resource;
pub mod trail;
pub mod validation;
pub mod value;

pub use auto_delete::AutoDeleteObjectsProvider;
pub use bucket::{BlockPublicAccess, Bucket, BucketEncryption, BucketProps};
pub use error::ResourceError;
pub use policy::{Conditions, Effect, PolicyDocument, PolicyStatement, Principal};
pub use resource::{RemovalPolicy, Resource, ResourceType};
pub use trail::{
    CLOUDTRAIL_SERVICE, DataResource, DataResourceType, EventSelector, EventSelectorOptions,
    ReadWriteType, S3EventSource, Trail, TrailLogicalIds, TrailProps,
};
pub use value::Value;
