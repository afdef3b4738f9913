//! trailstack - synthesize the audit trail stack.
//!
//! Declares two private S3 buckets and a CloudTrail trail recording object
//! writes of one into the other, and renders them as a CloudFormation
//! template for the provisioning engine.
//!
//! # Usage
//!
//! ```text
//! trailstack synth MyStack --account 123456789012 --output cdk.out
//! trailstack list
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TRAILSTACK_STACK_ID` | `S3PrivateBucketForTrailStack` | Stack identifier |
//! | `CDK_DEFAULT_ACCOUNT` | *(unset)* | Target account |
//! | `CDK_DEFAULT_REGION` | *(unset)* | Target region |
//! | `TRAILSTACK_OUT_DIR` | `cdk.out` | Template output directory |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trailstack_core::StackConfig;

use crate::commands::{ListCommand, SynthCommand};

#[derive(Debug, Parser)]
#[command(name = "trailstack", version, about = "Synthesize the audit trail stack")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize the CloudFormation template
    Synth(SynthCommand),
    /// List the resources of the stack
    List(ListCommand),
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so a template printed to stdout stays parseable.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StackConfig::from_env();

    init_tracing(&config.log_level)?;
    debug!(?config, "starting trailstack");

    match cli.command {
        Commands::Synth(cmd) => cmd.execute(config),
        Commands::List(cmd) => cmd.execute(config),
    }
}
