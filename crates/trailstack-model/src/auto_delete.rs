//! Emptying buckets on teardown.
//!
//! CloudFormation refuses to delete a bucket that still holds objects. A
//! bucket declared with `auto_delete_objects` therefore gets a
//! `Custom::S3AutoDeleteObjects` resource backed by a Lambda function that
//! deletes every object version when the resource is deleted. One provider
//! (function and role) is shared by all buckets of a stack.

use serde_json::json;

use crate::bucket::{AUTO_DELETE_OBJECTS_TAG, Bucket};
use crate::policy::{PolicyDocument, PolicyStatement, Principal};
use crate::resource::{RemovalPolicy, Resource, ResourceType};
use crate::value::Value;

/// Service principal of Lambda.
pub const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";

/// Actions the provider role needs on each bucket it empties.
pub const AUTO_DELETE_ACTIONS: &[&str] = &["s3:DeleteObject*", "s3:GetBucket*", "s3:List*"];

const HANDLER_RUNTIME: &str = "python3.12";
const HANDLER_TIMEOUT_SECS: u32 = 900;
const HANDLER_MEMORY_MB: u32 = 128;

/// Inline handler. Only buckets still carrying the auto-delete tag are
/// emptied, so removing the flag from a bucket never wipes it.
const HANDLER_SOURCE: &str = r#"import boto3
import cfnresponse
from botocore.exceptions import ClientError

TAG = "aws-cdk:auto-delete-objects"
s3 = boto3.client("s3")


def tagged(bucket):
    try:
        tags = s3.get_bucket_tagging(Bucket=bucket)["TagSet"]
    except ClientError:
        return False
    return any(t["Key"] == TAG and t["Value"] == "true" for t in tags)


def empty(bucket):
    pages = s3.get_paginator("list_object_versions").paginate(Bucket=bucket)
    for page in pages:
        items = page.get("Versions", []) + page.get("DeleteMarkers", [])
        objects = [{"Key": i["Key"], "VersionId": i["VersionId"]} for i in items]
        if objects:
            s3.delete_objects(Bucket=bucket, Delete={"Objects": objects})


def handler(event, context):
    bucket = event["ResourceProperties"]["BucketName"]
    try:
        if event["RequestType"] == "Delete" and tagged(bucket):
            empty(bucket)
        cfnresponse.send(event, context, cfnresponse.SUCCESS, {}, bucket)
    except Exception as e:
        cfnresponse.send(event, context, cfnresponse.FAILED, {"Error": str(e)}, bucket)
"#;

/// The Lambda-backed provider that empties tagged buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDeleteObjectsProvider {
    role: String,
    handler: String,
}

impl AutoDeleteObjectsProvider {
    /// Provider whose role and function use the given logical ids.
    #[must_use]
    pub fn new(role: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            handler: handler.into(),
        }
    }

    /// Logical id of the execution role.
    #[must_use]
    pub fn role_logical_id(&self) -> &str {
        &self.role
    }

    /// Logical id of the function.
    #[must_use]
    pub fn handler_logical_id(&self) -> &str {
        &self.handler
    }

    /// ARN of the execution role.
    #[must_use]
    pub fn role_arn(&self) -> Value {
        Value::get_att(&self.role, "Arn")
    }

    /// ARN of the function, used as the custom resource service token.
    #[must_use]
    pub fn handler_arn(&self) -> Value {
        Value::get_att(&self.handler, "Arn")
    }

    /// Bucket policy statement letting the provider list and delete objects.
    #[must_use]
    pub fn grant_for(&self, bucket: &Bucket) -> PolicyStatement {
        PolicyStatement::builder()
            .principals(vec![Principal::Aws(self.role_arn())])
            .actions(AUTO_DELETE_ACTIONS.iter().map(|a| (*a).to_owned()).collect())
            .resources(vec![bucket.bucket_arn(), bucket.arn_for_objects("*")])
            .build()
    }

    /// Role and function of the provider.
    #[must_use]
    pub fn resources(&self) -> Vec<(String, Resource)> {
        let assume = PolicyDocument::from_statements(vec![
            PolicyStatement::builder()
                .principals(vec![Principal::service(LAMBDA_SERVICE)])
                .actions(vec!["sts:AssumeRole".to_owned()])
                .build(),
        ]);
        let basic_execution = Value::concat([
            "arn:".into(),
            Value::partition(),
            ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole".into(),
        ]);
        let role = Resource::new(ResourceType::Role)
            .with_property("AssumeRolePolicyDocument", json!(assume))
            .with_property("ManagedPolicyArns", json!([basic_execution]));

        let function = Resource::new(ResourceType::Function)
            .with_property("Code", json!({"ZipFile": HANDLER_SOURCE}))
            .with_property(
                "Description",
                json!(format!(
                    "Empties S3 buckets tagged {AUTO_DELETE_OBJECTS_TAG} before they are deleted"
                )),
            )
            .with_property("Handler", json!("index.handler"))
            .with_property("MemorySize", json!(HANDLER_MEMORY_MB))
            .with_property("Role", json!(self.role_arn()))
            .with_property("Runtime", json!(HANDLER_RUNTIME))
            .with_property("Timeout", json!(HANDLER_TIMEOUT_SECS))
            .depending_on(&self.role);

        vec![(self.role.clone(), role), (self.handler.clone(), function)]
    }

    /// The custom resource emptying `bucket` when it is deleted.
    ///
    /// It waits for the bucket policy so the provider's grant is in place
    /// before any delete request can arrive.
    #[must_use]
    pub fn custom_resource(&self, bucket: &Bucket) -> Resource {
        let mut resource = Resource::new(ResourceType::AutoDeleteObjects)
            .with_property("ServiceToken", json!(self.handler_arn()))
            .with_property("BucketName", json!(bucket.bucket_ref()))
            .with_removal_policy(RemovalPolicy::Destroy);
        if let Some(policy) = bucket.policy_logical_id() {
            resource = resource.depending_on(policy);
        }
        resource
    }
}
