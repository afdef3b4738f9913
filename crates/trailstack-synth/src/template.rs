//! Synthesized CloudFormation templates.

use std::collections::BTreeMap;

use serde::Serialize;
use trailstack_model::{Resource, ResourceType};

use crate::error::{SynthError, SynthResult};

/// A deployment template, ready for the provisioning engine.
///
/// Resources are keyed by logical id and kept sorted, so rendering the same
/// stack twice yields byte-identical output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Optional template description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources by logical id.
    pub resources: BTreeMap<String, Resource>,
}

impl Template {
    /// Add a resource.
    ///
    /// # Errors
    /// Returns [`SynthError::DuplicateLogicalId`] if the id is taken.
    pub fn insert(&mut self, logical_id: String, resource: Resource) -> SynthResult<()> {
        if self.resources.contains_key(&logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Look up a resource by logical id.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources of the given type.
    pub fn resources_of_type(
        &self,
        resource_type: ResourceType,
    ) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    /// Number of resources of the given type.
    #[must_use]
    pub fn count_of_type(&self, resource_type: ResourceType) -> usize {
        self.resources_of_type(resource_type).count()
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a JSON value.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> SynthResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
