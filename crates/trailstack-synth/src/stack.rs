//! Stacks: the unit of deployment.
//!
//! A [`Stack`] owns every resource declared in it. Declarations hand back
//! typed handles ([`BucketRef`], [`TrailRef`]) that are only valid for the
//! issuing stack; all wiring between resources goes through those handles.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};
use trailstack_core::{Environment, StackId};
use trailstack_model::{
    AutoDeleteObjectsProvider, Bucket, BucketProps, EventSelectorOptions, PolicyStatement, ResourceError, S3EventSource,
    Trail, TrailLogicalIds, TrailProps, Value,
};
use typed_builder::TypedBuilder;

use crate::error::{SynthError, SynthResult};
use crate::logical_id::ConstructPath;
use crate::template::Template;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Construct id of the stack-wide provider that empties buckets.
pub const AUTO_DELETE_PROVIDER_ID: &str = "Custom::S3AutoDeleteObjectsCustomResourceProvider";

/// Optional stack parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct StackProps {
    /// Target deployment environment.
    #[builder(default)]
    pub env: Environment,
    /// Template description.
    #[builder(default, setter(strip_option, into))]
    pub description: Option<String>,
}

/// Handle to a bucket declared in a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketRef {
    pub(crate) stack: u64,
    pub(crate) index: usize,
}

/// Handle to a trail declared in a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrailRef {
    pub(crate) stack: u64,
    pub(crate) index: usize,
}

/// An S3 event source given by handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Source {
    /// Audited bucket.
    pub bucket: BucketRef,
    /// Only objects under this key prefix are audited.
    pub object_prefix: Option<String>,
}

impl From<BucketRef> for S3Source {
    fn from(bucket: BucketRef) -> Self {
        Self {
            bucket,
            object_prefix: None,
        }
    }
}

/// A set of resources deployed together.
#[derive(Debug)]
pub struct Stack {
    instance: u64,
    id: StackId,
    props: StackProps,
    construct_ids: BTreeSet<String>,
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) trails: Vec<Trail>,
    auto_delete: Option<AutoDeleteObjectsProvider>,
}

impl Stack {
    /// Create an empty stack.
    ///
    /// # Errors
    /// Returns an error if `id` is not a valid stack name.
    pub fn new(id: &str, props: StackProps) -> SynthResult<Self> {
        let id = StackId::new(id)?;
        debug!(stack = %id, env = ?props.env, "created stack");
        Ok(Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            id,
            props,
            construct_ids: BTreeSet::new(),
            buckets: Vec::new(),
            trails: Vec::new(),
            auto_delete: None,
        })
    }

    /// Stack identifier.
    #[must_use]
    pub fn id(&self) -> &StackId {
        &self.id
    }

    /// Stack parameters.
    #[must_use]
    pub fn props(&self) -> &StackProps {
        &self.props
    }

    /// The target account: a literal when pinned, else the deploy-time pseudo parameter.
    #[must_use]
    pub fn account(&self) -> Value {
        self.props
            .env
            .account
            .as_ref()
            .map_or_else(Value::account_id, |a| Value::from(a.as_str()))
    }

    /// The target region: a literal when pinned, else the deploy-time pseudo parameter.
    #[must_use]
    pub fn region(&self) -> Value {
        self.props
            .env
            .region
            .as_ref()
            .map_or_else(Value::region, |r| Value::from(r.as_str()))
    }

    /// Declared buckets, in declaration order.
    #[must_use]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Declared trails, in declaration order.
    #[must_use]
    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    /// The provider emptying auto-delete buckets, once one was declared.
    #[must_use]
    pub fn auto_delete_provider(&self) -> Option<&AutoDeleteObjectsProvider> {
        self.auto_delete.as_ref()
    }

    /// Resolve a bucket handle.
    ///
    /// # Errors
    /// Returns [`SynthError::ForeignHandle`] for a handle of another stack.
    pub fn bucket(&self, handle: BucketRef) -> SynthResult<&Bucket> {
        let index = self.bucket_index(handle)?;
        Ok(&self.buckets[index])
    }

    /// Resolve a trail handle.
    ///
    /// # Errors
    /// Returns [`SynthError::ForeignHandle`] for a handle of another stack.
    pub fn trail(&self, handle: TrailRef) -> SynthResult<&Trail> {
        let index = self.trail_index(handle)?;
        Ok(&self.trails[index])
    }

    /// Declare a bucket.
    ///
    /// A bucket with `auto_delete_objects` set grants the stack's emptying
    /// provider the right to delete its objects. The provider is declared
    /// with the first such bucket.
    ///
    /// # Errors
    /// Returns an error if the construct id is taken or invalid, the bucket
    /// name is malformed or already declared in this stack, or the props are
    /// inconsistent.
    pub fn add_bucket(&mut self, construct_id: &str, props: BucketProps) -> SynthResult<BucketRef> {
        self.check_construct_id(construct_id)?;

        if let Some(name) = &props.bucket_name {
            if let Some(existing) = self
                .buckets
                .iter()
                .find(|b| b.bucket_name() == Some(name.as_str()))
            {
                return Err(SynthError::DuplicateBucketName {
                    name: name.clone(),
                    first: existing.construct_id().to_owned(),
                    second: construct_id.to_owned(),
                });
            }
        }

        let path = ConstructPath::new(construct_id);
        let mut bucket = Bucket::new(
            construct_id,
            path.resource().logical_id(),
            path.child("Policy").resource().logical_id(),
            props,
        )?;

        if bucket.props().auto_delete_objects {
            let provider = self.ensure_auto_delete_provider()?;
            bucket.add_to_resource_policy(provider.grant_for(&bucket))?;
        }

        debug!(
            stack = %self.id,
            construct_id,
            logical_id = bucket.logical_id(),
            bucket_name = ?bucket.bucket_name(),
            "declared bucket"
        );

        self.construct_ids.insert(construct_id.to_owned());
        self.buckets.push(bucket);
        Ok(BucketRef {
            stack: self.instance,
            index: self.buckets.len() - 1,
        })
    }

    /// Declare a trail delivering into `destination`.
    ///
    /// # Errors
    /// Returns an error if the construct id is taken or invalid, the handle
    /// is foreign, or the props are invalid.
    pub fn add_trail(
        &mut self,
        construct_id: &str,
        destination: BucketRef,
        props: TrailProps,
    ) -> SynthResult<TrailRef> {
        let dest = self.bucket_index(destination)?;
        self.check_construct_id(construct_id)?;

        let path = ConstructPath::new(construct_id);
        let role = path.child("LogsRole");
        let ids = TrailLogicalIds {
            trail: path.resource().logical_id(),
            log_group: path.child("LogGroup").resource().logical_id(),
            logs_role: role.resource().logical_id(),
            logs_role_policy: role.child("DefaultPolicy").resource().logical_id(),
        };
        let trail = Trail::new(construct_id, ids, &self.buckets[dest], props)?;

        debug!(
            stack = %self.id,
            construct_id,
            logical_id = %trail.logical_ids().trail,
            destination = trail.destination(),
            "declared trail"
        );

        self.construct_ids.insert(construct_id.to_owned());
        self.trails.push(trail);
        Ok(TrailRef {
            stack: self.instance,
            index: self.trails.len() - 1,
        })
    }

    /// Append a statement to a bucket's resource policy.
    ///
    /// # Errors
    /// Returns an error for a foreign handle or an incomplete statement.
    pub fn add_to_resource_policy(
        &mut self,
        bucket: BucketRef,
        statement: PolicyStatement,
    ) -> SynthResult<()> {
        let index = self.bucket_index(bucket)?;
        self.buckets[index].add_to_resource_policy(statement)?;
        Ok(())
    }

    /// Check that every grant is part of the bucket's resource policy.
    ///
    /// # Errors
    /// Returns [`ResourceError::UnattachedGrant`] for the first grant missing.
    pub fn ensure_attached(&self, bucket: BucketRef, grants: &[PolicyStatement]) -> SynthResult<()> {
        let bucket = self.bucket(bucket)?;
        if let Some(missing) = grants.iter().find(|g| !bucket.policy().contains(g)) {
            return Err(ResourceError::UnattachedGrant {
                construct_id: bucket.construct_id().to_owned(),
                actions: missing.action_summary(),
            }
            .into());
        }
        Ok(())
    }

    /// Select S3 data events of `sources` on a trail.
    ///
    /// # Errors
    /// Returns an error for foreign handles or if a source is the trail's
    /// destination bucket.
    pub fn add_s3_event_selector(
        &mut self,
        trail: TrailRef,
        sources: &[S3Source],
        options: EventSelectorOptions,
    ) -> SynthResult<()> {
        let trail = self.trail_index(trail)?;
        let indices = sources
            .iter()
            .map(|s| self.bucket_index(s.bucket))
            .collect::<SynthResult<Vec<_>>>()?;

        let sources: Vec<S3EventSource<'_>> = indices
            .iter()
            .zip(sources)
            .map(|(&index, source)| S3EventSource {
                bucket: &self.buckets[index],
                object_prefix: source.object_prefix.as_deref(),
            })
            .collect();
        self.trails[trail].add_s3_event_selector(&sources, options)?;
        Ok(())
    }

    /// Render the stack into a template.
    ///
    /// # Errors
    /// Returns [`SynthError::DuplicateLogicalId`] if two resources collide.
    pub fn synth(&self) -> SynthResult<Template> {
        let mut template = Template {
            description: self.props.description.clone(),
            ..Template::default()
        };

        for bucket in &self.buckets {
            for (logical_id, resource) in bucket.resources() {
                template.insert(logical_id, resource)?;
            }
        }

        if let Some(provider) = &self.auto_delete {
            for (logical_id, resource) in provider.resources() {
                template.insert(logical_id, resource)?;
            }
            for bucket in self.buckets.iter().filter(|b| b.props().auto_delete_objects) {
                let logical_id = ConstructPath::new(bucket.construct_id())
                    .child("AutoDeleteObjectsCustomResource")
                    .child("Default")
                    .logical_id();
                template.insert(logical_id, provider.custom_resource(bucket))?;
            }
        }

        for trail in &self.trails {
            let destination_policy = self
                .buckets
                .iter()
                .find(|b| b.logical_id() == trail.destination())
                .and_then(Bucket::policy_logical_id);
            for (logical_id, resource) in trail.resources(destination_policy) {
                template.insert(logical_id, resource)?;
            }
        }

        info!(
            stack = %self.id,
            resources = template.resources.len(),
            "synthesized stack"
        );
        Ok(template)
    }

    fn ensure_auto_delete_provider(&mut self) -> SynthResult<&AutoDeleteObjectsProvider> {
        if self.auto_delete.is_none() {
            self.check_construct_id(AUTO_DELETE_PROVIDER_ID)?;
            self.construct_ids.insert(AUTO_DELETE_PROVIDER_ID.to_owned());
        }
        let stack = &self.id;
        Ok(self.auto_delete.get_or_insert_with(|| {
            let path = ConstructPath::new(AUTO_DELETE_PROVIDER_ID);
            let provider = AutoDeleteObjectsProvider::new(
                path.child("Role").logical_id(),
                path.child("Handler").logical_id(),
            );
            debug!(
                stack = %stack,
                handler = provider.handler_logical_id(),
                "declared auto-delete provider"
            );
            provider
        }))
    }

    fn check_construct_id(&self, construct_id: &str) -> SynthResult<()> {
        let invalid = |reason: &str| SynthError::InvalidConstructId {
            id: construct_id.to_owned(),
            reason: reason.to_owned(),
        };
        if construct_id.is_empty() {
            return Err(invalid("construct id must not be empty"));
        }
        if construct_id.contains('/') {
            return Err(invalid("construct id must not contain '/'"));
        }
        if self.construct_ids.contains(construct_id) {
            return Err(SynthError::DuplicateConstructId {
                id: construct_id.to_owned(),
                stack: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn bucket_index(&self, handle: BucketRef) -> SynthResult<usize> {
        if handle.stack != self.instance || handle.index >= self.buckets.len() {
            return Err(SynthError::ForeignHandle {
                kind: "bucket",
                stack: self.id.to_string(),
            });
        }
        Ok(handle.index)
    }

    fn trail_index(&self, handle: TrailRef) -> SynthResult<usize> {
        if handle.stack != self.instance || handle.index >= self.trails.len() {
            return Err(SynthError::ForeignHandle {
                kind: "trail",
                stack: self.id.to_string(),
            });
        }
        Ok(handle.index)
    }
}
