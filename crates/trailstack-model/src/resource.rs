//! Template resource entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// CloudFormation resource types this crate declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "AWS::S3::Bucket")]
    /// S3 bucket.
    Bucket,
    #[serde(rename = "AWS::S3::BucketPolicy")]
    /// S3 bucket resource policy.
    BucketPolicy,
    #[serde(rename = "AWS::CloudTrail::Trail")]
    /// CloudTrail trail.
    Trail,
    #[serde(rename = "AWS::Logs::LogGroup")]
    /// CloudWatch Logs log group.
    LogGroup,
    #[serde(rename = "AWS::IAM::Role")]
    /// IAM role.
    Role,
    #[serde(rename = "AWS::IAM::Policy")]
    /// IAM inline identity policy.
    Policy,
    #[serde(rename = "AWS::Lambda::Function")]
    /// Lambda function.
    Function,
    #[serde(rename = "Custom::S3AutoDeleteObjects")]
    /// Custom resource emptying a bucket before it is deleted.
    AutoDeleteObjects,
}

impl ResourceType {
    /// Returns the CloudFormation type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bucket => "AWS::S3::Bucket",
            Self::BucketPolicy => "AWS::S3::BucketPolicy",
            Self::Trail => "AWS::CloudTrail::Trail",
            Self::LogGroup => "AWS::Logs::LogGroup",
            Self::Role => "AWS::IAM::Role",
            Self::Policy => "AWS::IAM::Policy",
            Self::Function => "AWS::Lambda::Function",
            Self::AutoDeleteObjects => "Custom::S3AutoDeleteObjects",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Delete the resource on teardown.
    #[serde(rename = "Delete")]
    Destroy,
    /// Orphan the resource on teardown.
    #[default]
    Retain,
    /// Snapshot the resource's data, then delete it.
    Snapshot,
}

impl RemovalPolicy {
    /// Returns the CloudFormation policy value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

impl std::fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of a template's `Resources` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    /// CloudFormation type.
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    /// Type-specific properties.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Json>,
    /// Logical ids that must be created first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Policy applied when an update replaces the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
    /// Policy applied when the resource is removed from the stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
}

impl Resource {
    /// A resource of the given type with no properties.
    #[must_use]
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            properties: Map::new(),
            depends_on: Vec::new(),
            update_replace_policy: None,
            deletion_policy: None,
        }
    }

    /// Set a property, returning the updated resource.
    ///
    /// `value` must already be JSON; use `serde_json::json!` or
    /// `serde_json::to_value` on model types.
    #[must_use]
    pub fn with_property(mut self, name: &str, value: Json) -> Self {
        self.properties.insert(name.to_owned(), value);
        self
    }

    /// Apply the same removal policy on deletion and replacement.
    #[must_use]
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.update_replace_policy = Some(policy);
        self.deletion_policy = Some(policy);
        self
    }

    /// Add a dependency on another logical id.
    #[must_use]
    pub fn depending_on(mut self, logical_id: impl Into<String>) -> Self {
        let id = logical_id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }
}
