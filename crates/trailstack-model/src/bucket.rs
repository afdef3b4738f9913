//! S3 bucket declarations.
//!
//! A [`Bucket`] owns its resource policy: statements appended through
//! [`Bucket::add_to_resource_policy`] are rendered as a separate
//! `AWS::S3::BucketPolicy` resource next to the bucket itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::ResourceError;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::resource::{RemovalPolicy, Resource, ResourceType};
use crate::validation::{validate_bucket_name, validate_tags};
use crate::value::Value;

/// Tag marking a bucket whose objects are emptied before the bucket is deleted.
pub const AUTO_DELETE_OBJECTS_TAG: &str = "aws-cdk:auto-delete-objects";

/// Server-side encryption applied to objects at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BucketEncryption {
    /// No default encryption.
    Unencrypted,
    /// SSE-S3 (`AES256`), keys managed by S3.
    #[default]
    S3Managed,
    /// SSE-KMS with the AWS managed key.
    KmsManaged,
}

impl BucketEncryption {
    /// The `SSEAlgorithm` value, if encryption is enabled.
    #[must_use]
    pub fn sse_algorithm(&self) -> Option<&'static str> {
        match self {
            Self::Unencrypted => None,
            Self::S3Managed => Some("AES256"),
            Self::KmsManaged => Some("aws:kms"),
        }
    }
}

/// Public access block configuration for a bucket.
///
/// AWS defines exactly four boolean fields for this configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct BlockPublicAccess {
    /// Reject PUT requests carrying public ACLs.
    pub block_public_acls: bool,
    /// Reject bucket policies that grant public access.
    pub block_public_policy: bool,
    /// Ignore public ACLs already present.
    pub ignore_public_acls: bool,
    /// Restrict access to buckets with public policies.
    pub restrict_public_buckets: bool,
}

impl BlockPublicAccess {
    /// Block every form of public access.
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };

    /// Block public ACLs only; public policies stay possible.
    pub const BLOCK_ACLS: Self = Self {
        block_public_acls: true,
        block_public_policy: false,
        ignore_public_acls: true,
        restrict_public_buckets: false,
    };

    /// Whether all four flags are set.
    #[must_use]
    pub fn is_fully_blocked(&self) -> bool {
        *self == Self::BLOCK_ALL
    }
}

impl Default for BlockPublicAccess {
    fn default() -> Self {
        Self::BLOCK_ALL
    }
}

/// Declared properties of a bucket. Defaults are the hardened posture.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct BucketProps {
    /// Physical bucket name; generated by the engine when unset.
    #[builder(default, setter(strip_option, into))]
    pub bucket_name: Option<String>,
    /// Public access block configuration.
    #[builder(default = BlockPublicAccess::BLOCK_ALL)]
    pub block_public_access: BlockPublicAccess,
    /// Default object encryption.
    #[builder(default = BucketEncryption::S3Managed)]
    pub encryption: BucketEncryption,
    /// Teardown behaviour.
    #[builder(default = RemovalPolicy::Retain)]
    pub removal_policy: RemovalPolicy,
    /// Empty the bucket before deleting it. Requires [`RemovalPolicy::Destroy`].
    #[builder(default = false)]
    pub auto_delete_objects: bool,
    /// Additional bucket tags.
    #[builder(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for BucketProps {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A declared S3 bucket together with its resource policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    construct_id: String,
    logical_id: String,
    policy_logical_id: String,
    props: BucketProps,
    policy: PolicyDocument,
}

impl Bucket {
    /// Declare a bucket.
    ///
    /// `logical_id` names the bucket resource in the template and
    /// `policy_logical_id` the bucket policy resource, should one be needed.
    ///
    /// # Errors
    /// Returns an error for a malformed bucket name or tag, or when
    /// auto-deleting objects is requested without the Destroy removal policy.
    pub fn new(
        construct_id: impl Into<String>,
        logical_id: impl Into<String>,
        policy_logical_id: impl Into<String>,
        props: BucketProps,
    ) -> Result<Self, ResourceError> {
        let construct_id = construct_id.into();

        if let Some(name) = &props.bucket_name {
            validate_bucket_name(name)?;
        }
        validate_tags(&props.tags)?;
        if props.auto_delete_objects && props.removal_policy != RemovalPolicy::Destroy {
            return Err(ResourceError::AutoDeleteRequiresDestroy { construct_id });
        }

        Ok(Self {
            construct_id,
            logical_id: logical_id.into(),
            policy_logical_id: policy_logical_id.into(),
            props,
            policy: PolicyDocument::new(),
        })
    }

    /// Construct id within the stack.
    #[must_use]
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    /// Logical id of the bucket resource.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Logical id of the bucket policy resource, if the bucket has a policy.
    #[must_use]
    pub fn policy_logical_id(&self) -> Option<&str> {
        (!self.policy.is_empty()).then_some(self.policy_logical_id.as_str())
    }

    /// Declared properties.
    #[must_use]
    pub fn props(&self) -> &BucketProps {
        &self.props
    }

    /// Physical name, if declared.
    #[must_use]
    pub fn bucket_name(&self) -> Option<&str> {
        self.props.bucket_name.as_deref()
    }

    /// The bucket's resource policy.
    #[must_use]
    pub fn policy(&self) -> &PolicyDocument {
        &self.policy
    }

    /// The bucket name as a deploy-time reference.
    #[must_use]
    pub fn bucket_ref(&self) -> Value {
        Value::reference(&self.logical_id)
    }

    /// The bucket ARN.
    #[must_use]
    pub fn bucket_arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }

    /// ARN matching objects under `pattern`, e.g. `AWSLogs/*`.
    #[must_use]
    pub fn arn_for_objects(&self, pattern: impl Into<Value>) -> Value {
        Value::concat([self.bucket_arn(), "/".into(), pattern.into()])
    }

    /// Append a statement to the bucket's resource policy.
    ///
    /// # Errors
    /// Returns an error if the statement lacks actions, principals, or resources.
    pub fn add_to_resource_policy(
        &mut self,
        statement: PolicyStatement,
    ) -> Result<(), ResourceError> {
        statement.validate_for_resource_policy()?;
        debug!(
            bucket = %self.construct_id,
            actions = %statement.action_summary(),
            "attached statement to bucket policy"
        );
        self.policy.add_statement(statement);
        Ok(())
    }

    /// Template resources for the bucket and, if non-empty, its policy.
    #[must_use]
    pub fn resources(&self) -> Vec<(String, Resource)> {
        let mut bucket = Resource::new(ResourceType::Bucket);

        if let Some(algorithm) = self.props.encryption.sse_algorithm() {
            bucket = bucket.with_property(
                "BucketEncryption",
                json!({
                    "ServerSideEncryptionConfiguration": [
                        {"ServerSideEncryptionByDefault": {"SSEAlgorithm": algorithm}}
                    ]
                }),
            );
        }
        if let Some(name) = &self.props.bucket_name {
            bucket = bucket.with_property("BucketName", json!(name));
        }
        bucket = bucket.with_property(
            "PublicAccessBlockConfiguration",
            json!(self.props.block_public_access),
        );

        let mut tags = self.props.tags.clone();
        if self.props.auto_delete_objects {
            tags.insert(AUTO_DELETE_OBJECTS_TAG.to_owned(), "true".to_owned());
        }
        if !tags.is_empty() {
            let tags: Vec<_> = tags
                .iter()
                .map(|(key, value)| json!({"Key": key, "Value": value}))
                .collect();
            bucket = bucket.with_property("Tags", json!(tags));
        }

        let mut out = vec![(
            self.logical_id.clone(),
            bucket.with_removal_policy(self.props.removal_policy),
        )];

        if !self.policy.is_empty() {
            let policy = Resource::new(ResourceType::BucketPolicy)
                .with_property("Bucket", json!(self.bucket_ref()))
                .with_property("PolicyDocument", json!(self.policy));
            out.push((self.policy_logical_id.clone(), policy));
        }

        out
    }
}
