//! IAM policy statements and documents.
//!
//! Statements serialize to the IAM JSON policy grammar: single-element lists
//! collapse to scalars, principals are grouped by kind, and empty optional
//! blocks are omitted.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ResourceError;
use crate::value::Value;

/// IAM policy language version emitted in every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Condition block: operator → condition key → expected value.
pub type Conditions = BTreeMap<String, BTreeMap<String, String>>;

/// Whether a statement allows or denies its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Effect {
    /// Grant the actions.
    #[default]
    Allow,
    /// Deny the actions, overriding any allow.
    Deny,
}

impl Effect {
    /// Returns the string value of this effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// An AWS service, e.g. `cloudtrail.amazonaws.com`.
    Service(String),
    /// An account or role ARN.
    Aws(Value),
    /// Everyone (`"*"`).
    Anyone,
}

impl Principal {
    /// Service principal for the given service endpoint name.
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }
}

/// A single permission grant.
///
/// # Examples
///
/// ```
/// use trailstack_model::{Effect, PolicyStatement, Principal, Value};
///
/// let stmt = PolicyStatement::builder()
///     .principals(vec![Principal::service("cloudtrail.amazonaws.com")])
///     .actions(vec!["s3:GetBucketAcl".to_owned()])
///     .resources(vec![Value::get_att("TrailBucket", "Arn")])
///     .build();
/// assert_eq!(stmt.effect, Effect::Allow);
/// assert!(stmt.validate_for_resource_policy().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct PolicyStatement {
    /// Optional statement id.
    #[builder(default, setter(strip_option, into))]
    pub sid: Option<String>,
    /// Allow or deny.
    #[builder(default)]
    pub effect: Effect,
    /// Principals (required in resource policies, forbidden in identity policies).
    #[builder(default)]
    pub principals: Vec<Principal>,
    /// Actions, e.g. `s3:PutObject`.
    pub actions: Vec<String>,
    /// Resources the actions apply to.
    #[builder(default)]
    pub resources: Vec<Value>,
    /// Optional conditions.
    #[builder(default)]
    pub conditions: Conditions,
}

impl PolicyStatement {
    /// Add a condition, returning the updated statement.
    #[must_use]
    pub fn with_condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Check the statement is usable inside a resource (bucket) policy.
    ///
    /// # Errors
    /// Returns an error if actions, principals, or resources are empty.
    pub fn validate_for_resource_policy(&self) -> Result<(), ResourceError> {
        self.validate_for_identity_policy()?;
        if self.principals.is_empty() {
            return Err(ResourceError::EmptyPrincipals);
        }
        Ok(())
    }

    /// Check the statement is usable inside an identity (role) policy.
    ///
    /// # Errors
    /// Returns an error if actions or resources are empty.
    pub fn validate_for_identity_policy(&self) -> Result<(), ResourceError> {
        if self.actions.is_empty() {
            return Err(ResourceError::EmptyActions);
        }
        if self.resources.is_empty() {
            return Err(ResourceError::EmptyResources);
        }
        Ok(())
    }

    /// Whether every action of the statement is in `allowed`.
    #[must_use]
    pub fn grants_only(&self, allowed: &[&str]) -> bool {
        self.actions.iter().all(|a| allowed.contains(&a.as_str()))
    }

    /// Actions joined with commas, for diagnostics.
    #[must_use]
    pub fn action_summary(&self) -> String {
        self.actions.join(",")
    }
}

/// A list serialized as a scalar when it has exactly one element.
#[derive(Serialize)]
#[serde(untagged)]
enum OneOrMany<'a, T> {
    One(&'a T),
    Many(&'a [T]),
}

fn one_or_many<T>(items: &[T]) -> OneOrMany<'_, T> {
    match items {
        [single] => OneOrMany::One(single),
        many => OneOrMany::Many(many),
    }
}

/// Principals grouped by kind.
struct Principals<'a>(&'a [Principal]);

impl Serialize for Principals<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.iter().any(|p| matches!(p, Principal::Anyone)) {
            return serializer.serialize_str("*");
        }

        let aws: Vec<&Value> = self
            .0
            .iter()
            .filter_map(|p| match p {
                Principal::Aws(v) => Some(v),
                _ => None,
            })
            .collect();
        let services: Vec<&String> = self
            .0
            .iter()
            .filter_map(|p| match p {
                Principal::Service(s) => Some(s),
                _ => None,
            })
            .collect();

        let mut map = serializer.serialize_map(None)?;
        if !aws.is_empty() {
            map.serialize_entry("AWS", &one_or_many(&aws))?;
        }
        if !services.is_empty() {
            map.serialize_entry("Service", &one_or_many(&services))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StatementJson<'a> {
    action: OneOrMany<'a, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<&'a Conditions>,
    effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal: Option<Principals<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<OneOrMany<'a, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<&'a str>,
}

impl Serialize for PolicyStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StatementJson {
            action: one_or_many(&self.actions),
            condition: (!self.conditions.is_empty()).then_some(&self.conditions),
            effect: self.effect,
            principal: (!self.principals.is_empty()).then(|| Principals(&self.principals)),
            resource: (!self.resources.is_empty()).then(|| one_or_many(&self.resources)),
            sid: self.sid.as_deref(),
        }
        .serialize(serializer)
    }
}

/// An ordered list of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from statements.
    #[must_use]
    pub fn from_statements(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    /// Append a statement.
    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    /// The statements, in insertion order.
    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Whether the document contains an equal statement.
    #[must_use]
    pub fn contains(&self, statement: &PolicyStatement) -> bool {
        self.statements.contains(statement)
    }

    /// Whether the document has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("Statement", &self.statements)?;
        map.serialize_entry("Version", POLICY_VERSION)?;
        map.end()
    }
}
