//! Common AWS type definitions shared across the trailstack crates.

use std::fmt;

use crate::error::TrailStackError;

/// Maximum length of a CloudFormation stack name.
const MAX_STACK_ID_LEN: usize = 128;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, TrailStackError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(TrailStackError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment identifier, usable as a CloudFormation stack name.
///
/// Stack names are 1-128 characters, start with a letter, and contain only
/// ASCII alphanumerics and hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StackId(String);

impl StackId {
    /// Create a validated stack identifier.
    ///
    /// # Errors
    /// Returns [`TrailStackError::InvalidStackId`] if the name breaks the
    /// CloudFormation stack naming rules.
    pub fn new(id: impl Into<String>) -> Result<Self, TrailStackError> {
        let id = id.into();
        let reject = |reason: &str| TrailStackError::InvalidStackId {
            id: id.clone(),
            reason: reason.to_owned(),
        };

        if id.is_empty() || id.len() > MAX_STACK_ID_LEN {
            return Err(reject("stack id must be between 1 and 128 characters long"));
        }
        if !id.as_bytes()[0].is_ascii_alphabetic() {
            return Err(reject("stack id must start with a letter"));
        }
        if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(reject(
                "stack id must only contain ASCII letters, digits, and hyphens",
            ));
        }
        Ok(Self(id))
    }

    /// Get the stack id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target deployment environment of a stack.
///
/// Unset fields are left to the provisioning engine, which substitutes the
/// account and region it deploys into.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Target account, if pinned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountId>,
    /// Target region, if pinned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<AwsRegion>,
}

impl Environment {
    /// An environment with both account and region left to the engine.
    #[must_use]
    pub fn agnostic() -> Self {
        Self::default()
    }

    /// Whether neither account nor region is pinned.
    #[must_use]
    pub fn is_agnostic(&self) -> bool {
        self.account.is_none() && self.region.is_none()
    }
}
