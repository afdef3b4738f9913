//! Core types, configuration, and errors for trailstack.
//!
//! This crate provides the foundational building blocks shared by the model
//! and synthesis crates: account, region, and stack identifiers, the target
//! deployment [`Environment`], and environment-driven [`StackConfig`].

mod config;
mod error;
mod types;

pub use config::{DEFAULT_STACK_ID, StackConfig};
pub use error::{TrailStackError, TrailStackResult};
pub use types::{AccountId, AwsRegion, Environment, StackId};
