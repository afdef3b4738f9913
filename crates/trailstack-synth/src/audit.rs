//! The audit trail stack: a data bucket whose writes are recorded by a
//! CloudTrail trail into a private trail bucket.

use tracing::info;
use trailstack_model::{
    Bucket, BucketProps, CLOUDTRAIL_SERVICE, EventSelectorOptions, PolicyStatement, Principal,
    ReadWriteType, RemovalPolicy, Trail, TrailProps, Value,
};

use crate::error::SynthResult;
use crate::stack::{BucketRef, Stack, StackProps, TrailRef};
use crate::template::Template;

/// Construct id of the audited bucket. The spelling is kept: the logical id
/// derives from it, and changing it replaces the deployed bucket.
pub const DATA_BUCKET_ID: &str = "samleTargetBucket";

/// Physical name of the audited bucket.
pub const DATA_BUCKET_NAME: &str = "sublog.sample-target-bucket";

/// Construct id of the bucket receiving audit records.
pub const TRAIL_BUCKET_ID: &str = "sampleTrailBucket";

/// Physical name of the bucket receiving audit records.
pub const TRAIL_BUCKET_NAME: &str = "sublog.sample-trail-bucket";

/// Construct id of the trail.
pub const TRAIL_ID: &str = "sampleTargetTrail";

/// Canned ACL CloudTrail must set on delivered objects.
const BUCKET_OWNER_FULL_CONTROL: &str = "bucket-owner-full-control";

/// Grants CloudTrail needs to deliver log files into `trail_bucket`.
///
/// CloudTrail checks the bucket ACL before delivery, then writes objects under
/// `AWSLogs/<account>/`, handing ownership to the bucket owner.
#[must_use]
pub fn cloudtrail_delivery_grants(trail_bucket: &Bucket, account: &Value) -> Vec<PolicyStatement> {
    let acl_check = PolicyStatement::builder()
        .principals(vec![Principal::service(CLOUDTRAIL_SERVICE)])
        .actions(vec!["s3:GetBucketAcl".to_owned()])
        .resources(vec![trail_bucket.bucket_arn()])
        .build();

    let objects = Value::concat(["AWSLogs/".into(), account.clone(), "/*".into()]);
    let write = PolicyStatement::builder()
        .principals(vec![Principal::service(CLOUDTRAIL_SERVICE)])
        .actions(vec!["s3:PutObject".to_owned()])
        .resources(vec![trail_bucket.arn_for_objects(objects)])
        .build()
        .with_condition("StringEquals", "s3:x-amz-acl", BUCKET_OWNER_FULL_CONTROL);

    vec![acl_check, write]
}

fn disposable_bucket(name: &str) -> BucketProps {
    BucketProps::builder()
        .bucket_name(name)
        .removal_policy(RemovalPolicy::Destroy)
        .auto_delete_objects(true)
        .build()
}

/// Two private buckets and a trail auditing object writes of one into the other.
#[derive(Debug)]
pub struct AuditTrailStack {
    stack: Stack,
    data_bucket: BucketRef,
    trail_bucket: BucketRef,
    trail: TrailRef,
    grants: Vec<PolicyStatement>,
}

impl AuditTrailStack {
    /// Declare the stack.
    ///
    /// # Errors
    /// Returns an error if `id` is not a valid stack name, or if any
    /// declaration is rejected.
    pub fn new(id: &str, props: StackProps) -> SynthResult<Self> {
        let mut stack = Stack::new(id, props)?;

        let data_bucket = stack.add_bucket(DATA_BUCKET_ID, disposable_bucket(DATA_BUCKET_NAME))?;
        let trail_bucket =
            stack.add_bucket(TRAIL_BUCKET_ID, disposable_bucket(TRAIL_BUCKET_NAME))?;

        let grants = cloudtrail_delivery_grants(stack.bucket(trail_bucket)?, &stack.account());
        for grant in &grants {
            stack.add_to_resource_policy(trail_bucket, grant.clone())?;
        }
        stack.ensure_attached(trail_bucket, &grants)?;

        let trail = stack.add_trail(
            TRAIL_ID,
            trail_bucket,
            TrailProps::builder().send_to_cloud_watch_logs(true).build(),
        )?;
        stack.add_s3_event_selector(
            trail,
            &[data_bucket.into()],
            EventSelectorOptions::builder()
                .include_management_events(false)
                .read_write_type(ReadWriteType::WriteOnly)
                .build(),
        )?;

        info!(stack = %stack.id(), "declared audit trail stack");

        Ok(Self {
            stack,
            data_bucket,
            trail_bucket,
            trail,
            grants,
        })
    }

    /// The underlying stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The audited bucket.
    ///
    /// # Errors
    /// Never fails for a constructed stack; the handle is issued by it.
    pub fn data_bucket(&self) -> SynthResult<&Bucket> {
        self.stack.bucket(self.data_bucket)
    }

    /// The bucket receiving audit records.
    ///
    /// # Errors
    /// Never fails for a constructed stack; the handle is issued by it.
    pub fn trail_bucket(&self) -> SynthResult<&Bucket> {
        self.stack.bucket(self.trail_bucket)
    }

    /// The trail.
    ///
    /// # Errors
    /// Never fails for a constructed stack; the handle is issued by it.
    pub fn trail(&self) -> SynthResult<&Trail> {
        self.stack.trail(self.trail)
    }

    /// Grants given to CloudTrail on the trail bucket.
    #[must_use]
    pub fn grants(&self) -> &[PolicyStatement] {
        &self.grants
    }

    /// Render the stack into a template.
    ///
    /// # Errors
    /// Returns an error if two resources collide on a logical id.
    pub fn synth(&self) -> SynthResult<Template> {
        self.stack.synth()
    }
}
