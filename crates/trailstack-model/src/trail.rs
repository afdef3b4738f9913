//! CloudTrail trail declarations.
//!
//! A [`Trail`] delivers audit records into a destination [`Bucket`] and
//! selects data events through [`EventSelector`]s. When mirrored to
//! CloudWatch Logs it also declares the log group and the role CloudTrail
//! assumes to write into it.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::bucket::Bucket;
use crate::error::ResourceError;
use crate::policy::{PolicyDocument, PolicyStatement, Principal};
use crate::resource::{RemovalPolicy, Resource, ResourceType};
use crate::value::Value;

/// Service principal of CloudTrail.
pub const CLOUDTRAIL_SERVICE: &str = "cloudtrail.amazonaws.com";

/// Retention periods (days) accepted by CloudWatch Logs.
const LOG_RETENTION_DAYS: &[u32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

/// Which API calls an event selector captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadWriteType {
    /// Read-only calls (`GetObject`, ...).
    ReadOnly,
    /// Mutating calls (`PutObject`, `DeleteObjects`, ...).
    WriteOnly,
    /// Every call.
    #[default]
    All,
    /// No calls.
    None,
}

impl ReadWriteType {
    /// Returns the CloudFormation value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "ReadOnly",
            Self::WriteOnly => "WriteOnly",
            Self::All => "All",
            Self::None => "None",
        }
    }
}

impl std::fmt::Display for ReadWriteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of data resource an event selector watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataResourceType {
    /// S3 object-level operations.
    #[serde(rename = "AWS::S3::Object")]
    S3Object,
}

/// Resources watched by an event selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataResource {
    /// Resource kind.
    #[serde(rename = "Type")]
    pub resource_type: DataResourceType,
    /// ARN prefixes selecting the watched resources.
    pub values: Vec<Value>,
}

/// An S3 source for an event selector.
#[derive(Debug, Clone, Copy)]
pub struct S3EventSource<'a> {
    /// Audited bucket.
    pub bucket: &'a Bucket,
    /// Only objects under this key prefix are audited.
    pub object_prefix: Option<&'a str>,
}

impl<'a> S3EventSource<'a> {
    /// Audit every object of `bucket`.
    #[must_use]
    pub fn bucket(bucket: &'a Bucket) -> Self {
        Self {
            bucket,
            object_prefix: None,
        }
    }
}

/// Event filter options shared by all sources of one selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct EventSelectorOptions {
    /// Whether management (control-plane) events are captured as well.
    #[builder(default = true)]
    pub include_management_events: bool,
    /// Which calls are captured.
    #[builder(default = ReadWriteType::All)]
    pub read_write_type: ReadWriteType,
}

impl Default for EventSelectorOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A data-event filter of a trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSelector {
    /// Watched resources.
    pub data_resources: Vec<DataResource>,
    /// Whether management events are included.
    pub include_management_events: bool,
    /// Which calls are captured.
    pub read_write_type: ReadWriteType,
    /// Logical ids of the audited buckets.
    #[serde(skip)]
    pub source_buckets: Vec<String>,
}

/// Declared properties of a trail.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct TrailProps {
    /// Physical trail name; generated by the engine when unset.
    #[builder(default, setter(strip_option, into))]
    pub trail_name: Option<String>,
    /// Mirror events to a CloudWatch Logs group.
    #[builder(default = false)]
    pub send_to_cloud_watch_logs: bool,
    /// Retention of the mirrored log group.
    #[builder(default = 365)]
    pub cloud_watch_logs_retention_days: u32,
    /// Record events of global services (IAM, STS, ...).
    #[builder(default = true)]
    pub include_global_service_events: bool,
    /// Record events from every region.
    #[builder(default = true)]
    pub is_multi_region_trail: bool,
    /// Deliver digest files for integrity validation.
    #[builder(default = true)]
    pub enable_file_validation: bool,
    /// Key prefix for delivered log files.
    #[builder(default, setter(strip_option, into))]
    pub s3_key_prefix: Option<String>,
}

impl Default for TrailProps {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Logical ids of the resources a trail expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailLogicalIds {
    /// The trail itself.
    pub trail: String,
    /// CloudWatch Logs group.
    pub log_group: String,
    /// Role CloudTrail assumes to write to the group.
    pub logs_role: String,
    /// Inline policy of that role.
    pub logs_role_policy: String,
}

/// A declared CloudTrail trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    construct_id: String,
    ids: TrailLogicalIds,
    props: TrailProps,
    destination: String,
    event_selectors: Vec<EventSelector>,
}

impl Trail {
    /// Declare a trail delivering into `destination`.
    ///
    /// # Errors
    /// Returns an error if the log retention is not one CloudWatch Logs accepts.
    pub fn new(
        construct_id: impl Into<String>,
        ids: TrailLogicalIds,
        destination: &Bucket,
        props: TrailProps,
    ) -> Result<Self, ResourceError> {
        if props.send_to_cloud_watch_logs
            && !LOG_RETENTION_DAYS.contains(&props.cloud_watch_logs_retention_days)
        {
            return Err(ResourceError::InvalidLogRetention {
                days: props.cloud_watch_logs_retention_days,
            });
        }

        Ok(Self {
            construct_id: construct_id.into(),
            ids,
            props,
            destination: destination.logical_id().to_owned(),
            event_selectors: Vec::new(),
        })
    }

    /// Construct id within the stack.
    #[must_use]
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    /// Logical ids of the trail's resources.
    #[must_use]
    pub fn logical_ids(&self) -> &TrailLogicalIds {
        &self.ids
    }

    /// Declared properties.
    #[must_use]
    pub fn props(&self) -> &TrailProps {
        &self.props
    }

    /// Logical id of the destination bucket.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Declared event selectors.
    #[must_use]
    pub fn event_selectors(&self) -> &[EventSelector] {
        &self.event_selectors
    }

    /// Select S3 data events of the given sources.
    ///
    /// # Errors
    /// Returns [`ResourceError::SelfAuditingTrail`] if a source is the
    /// trail's own destination bucket; auditing it would log every delivery.
    pub fn add_s3_event_selector(
        &mut self,
        sources: &[S3EventSource<'_>],
        options: EventSelectorOptions,
    ) -> Result<(), ResourceError> {
        if let Some(own) = sources
            .iter()
            .find(|s| s.bucket.logical_id() == self.destination)
        {
            return Err(ResourceError::SelfAuditingTrail {
                trail: self.construct_id.clone(),
                bucket: own.bucket.construct_id().to_owned(),
            });
        }

        let values = sources
            .iter()
            .map(|s| s.bucket.arn_for_objects(s.object_prefix.unwrap_or_default()))
            .collect();
        let source_buckets = sources
            .iter()
            .map(|s| s.bucket.logical_id().to_owned())
            .collect();

        debug!(
            trail = %self.construct_id,
            sources = sources.len(),
            read_write_type = %options.read_write_type,
            include_management_events = options.include_management_events,
            "added S3 event selector"
        );

        self.event_selectors.push(EventSelector {
            data_resources: vec![DataResource {
                resource_type: DataResourceType::S3Object,
                values,
            }],
            include_management_events: options.include_management_events,
            read_write_type: options.read_write_type,
            source_buckets,
        });
        Ok(())
    }

    /// Template resources of the trail.
    ///
    /// `destination_policy` is the logical id of the destination bucket's
    /// policy; the trail waits for it so delivery is permitted from the start.
    #[must_use]
    pub fn resources(&self, destination_policy: Option<&str>) -> Vec<(String, Resource)> {
        let mut out = Vec::new();
        let mut trail = Resource::new(ResourceType::Trail);

        if self.props.send_to_cloud_watch_logs {
            let log_group_arn = Value::get_att(&self.ids.log_group, "Arn");

            let log_group = Resource::new(ResourceType::LogGroup)
                .with_property(
                    "RetentionInDays",
                    json!(self.props.cloud_watch_logs_retention_days),
                )
                .with_removal_policy(RemovalPolicy::Retain);

            let assume = PolicyDocument::from_statements(vec![
                PolicyStatement::builder()
                    .principals(vec![Principal::service(CLOUDTRAIL_SERVICE)])
                    .actions(vec!["sts:AssumeRole".to_owned()])
                    .build(),
            ]);
            let role = Resource::new(ResourceType::Role)
                .with_property("AssumeRolePolicyDocument", json!(assume));

            let deliver = PolicyDocument::from_statements(vec![
                PolicyStatement::builder()
                    .actions(vec![
                        "logs:PutLogEvents".to_owned(),
                        "logs:CreateLogStream".to_owned(),
                    ])
                    .resources(vec![log_group_arn.clone()])
                    .build(),
            ]);
            let role_policy = Resource::new(ResourceType::Policy)
                .with_property("PolicyDocument", json!(deliver))
                .with_property("PolicyName", json!(self.ids.logs_role_policy))
                .with_property("Roles", json!([Value::reference(&self.ids.logs_role)]));

            trail = trail
                .with_property("CloudWatchLogsLogGroupArn", json!(log_group_arn))
                .with_property(
                    "CloudWatchLogsRoleArn",
                    json!(Value::get_att(&self.ids.logs_role, "Arn")),
                )
                .depending_on(&self.ids.logs_role_policy);

            out.push((self.ids.log_group.clone(), log_group));
            out.push((self.ids.logs_role.clone(), role));
            out.push((self.ids.logs_role_policy.clone(), role_policy));
        }

        trail = trail
            .with_property(
                "EnableLogFileValidation",
                json!(self.props.enable_file_validation),
            )
            .with_property(
                "IncludeGlobalServiceEvents",
                json!(self.props.include_global_service_events),
            )
            .with_property("IsLogging", json!(true))
            .with_property("IsMultiRegionTrail", json!(self.props.is_multi_region_trail))
            .with_property(
                "S3BucketName",
                json!(Value::reference(&self.destination)),
            );

        if !self.event_selectors.is_empty() {
            trail = trail.with_property("EventSelectors", json!(self.event_selectors));
        }
        if let Some(prefix) = &self.props.s3_key_prefix {
            trail = trail.with_property("S3KeyPrefix", json!(prefix));
        }
        if let Some(name) = &self.props.trail_name {
            trail = trail.with_property("TrailName", json!(name));
        }
        if let Some(policy) = destination_policy {
            trail = trail.depending_on(policy);
        }

        out.push((self.ids.trail.clone(), trail));
        out
    }
}
