//! Configuration management for trailstack.
//!
//! Configuration is driven by environment variables, following the CDK
//! conventions for the ambient deployment environment (`CDK_DEFAULT_ACCOUNT`,
//! `CDK_DEFAULT_REGION`).

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::TrailStackResult;
use crate::types::{AccountId, AwsRegion, Environment, StackId};

/// Default deployment identifier of the audit stack.
pub const DEFAULT_STACK_ID: &str = "S3PrivateBucketForTrailStack";

/// Synthesis configuration.
///
/// # Examples
///
/// ```
/// use trailstack_core::StackConfig;
///
/// let config = StackConfig::default();
/// assert_eq!(config.out_dir, "cdk.out");
/// assert!(config.account.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    /// Deployment identifier of the synthesized stack.
    #[builder(default = String::from(DEFAULT_STACK_ID))]
    pub stack_id: String,

    /// Target account. `None` leaves the account to the provisioning engine.
    #[builder(default)]
    pub account: Option<String>,

    /// Target region. `None` leaves the region to the provisioning engine.
    #[builder(default)]
    pub region: Option<String>,

    /// Directory that receives synthesized templates.
    #[builder(default = String::from("cdk.out"))]
    pub out_dir: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_id: String::from(DEFAULT_STACK_ID),
            account: None,
            region: None,
            out_dir: String::from("cdk.out"),
            log_level: String::from("info"),
        }
    }
}

impl StackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `TRAILSTACK_STACK_ID` | `S3PrivateBucketForTrailStack` |
    /// | `CDK_DEFAULT_ACCOUNT` | *(unset)* |
    /// | `CDK_DEFAULT_REGION` | *(unset)* |
    /// | `TRAILSTACK_OUT_DIR` | `cdk.out` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("TRAILSTACK_STACK_ID") {
            config.stack_id = v;
        }
        if let Some(v) = non_empty_var("CDK_DEFAULT_ACCOUNT") {
            config.account = Some(v);
        }
        if let Some(v) = non_empty_var("CDK_DEFAULT_REGION") {
            config.region = Some(v);
        }
        if let Ok(v) = std::env::var("TRAILSTACK_OUT_DIR") {
            config.out_dir = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Validated stack identifier.
    ///
    /// # Errors
    /// Returns an error if `stack_id` is not a valid stack name.
    pub fn stack_id(&self) -> TrailStackResult<StackId> {
        StackId::new(self.stack_id.clone())
    }

    /// Validated deployment environment.
    ///
    /// # Errors
    /// Returns an error if `account` is set but is not a 12-digit account ID.
    pub fn environment(&self) -> TrailStackResult<Environment> {
        let account = self.account.clone().map(AccountId::new).transpose()?;
        let region = self.region.clone().map(AwsRegion::new);
        Ok(Environment { account, region })
    }
}

/// Read an environment variable, treating an empty value as unset.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
