//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use trailstack_core::StackConfig;
use trailstack_synth::{AuditTrailStack, StackProps, Template};

/// Options selecting the stack and its deployment environment.
#[derive(Debug, Clone, Default, Args)]
pub struct StackArgs {
    /// Stack identifier (defaults to `TRAILSTACK_STACK_ID` or `S3PrivateBucketForTrailStack`)
    pub stack_id: Option<String>,

    /// Target account id (overrides `CDK_DEFAULT_ACCOUNT`)
    #[arg(long)]
    pub account: Option<String>,

    /// Target region (overrides `CDK_DEFAULT_REGION`)
    #[arg(long)]
    pub region: Option<String>,
}

impl StackArgs {
    /// Apply explicit flags on top of the environment configuration.
    pub fn apply(&self, config: &mut StackConfig) {
        if let Some(id) = &self.stack_id {
            config.stack_id.clone_from(id);
        }
        if let Some(account) = &self.account {
            config.account = Some(account.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
    }
}

/// Write the template to disk or stdout.
#[derive(Debug, Clone, Default, Args)]
pub struct SynthCommand {
    #[command(flatten)]
    stack: StackArgs,

    /// Output directory (overrides `TRAILSTACK_OUT_DIR`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the template instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

impl SynthCommand {
    /// Run the command.
    pub fn execute(&self, mut config: StackConfig) -> Result<()> {
        self.stack.apply(&mut config);
        if let Some(dir) = &self.output {
            config.out_dir = dir.display().to_string();
        }

        let template = build_stack(&config)?.synth()?;
        if self.stdout {
            println!("{}", template.to_json()?);
        } else {
            let path = write_template(&template, Path::new(&config.out_dir), &config.stack_id)?;
            println!("{}", path.display());
        }
        Ok(())
    }
}

/// Print the logical ids and types of the stack's resources.
#[derive(Debug, Clone, Default, Args)]
pub struct ListCommand {
    #[command(flatten)]
    stack: StackArgs,
}

impl ListCommand {
    /// Run the command.
    pub fn execute(&self, mut config: StackConfig) -> Result<()> {
        self.stack.apply(&mut config);
        let template = build_stack(&config)?.synth()?;
        for line in resource_lines(&template) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Declare the audit trail stack described by `config`.
pub fn build_stack(config: &StackConfig) -> Result<AuditTrailStack> {
    let id = config.stack_id().context("invalid stack id")?;
    let env = config
        .environment()
        .context("invalid deployment environment")?;
    let props = StackProps::builder().env(env).build();
    AuditTrailStack::new(id.as_str(), props)
        .with_context(|| format!("failed to declare stack {id}"))
}

/// Write `<out_dir>/<stack_id>.template.json`, returning its path.
pub fn write_template(template: &Template, out_dir: &Path, stack_id: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create output directory {}", out_dir.display()))?;

    let path = out_dir.join(format!("{stack_id}.template.json"));
    let json = template.to_json()?;
    std::fs::write(&path, json + "\n")
        .with_context(|| format!("cannot write template to {}", path.display()))?;

    info!(
        path = %path.display(),
        resources = template.resources.len(),
        "wrote template"
    );
    Ok(path)
}

/// One `<logical id>  <type>` line per resource, sorted by logical id.
pub fn resource_lines(template: &Template) -> Vec<String> {
    let width = template.resources.keys().map(String::len).max().unwrap_or(0);
    template
        .resources
        .iter()
        .map(|(id, resource)| format!("{id:<width$}  {}", resource.resource_type))
        .collect()
}
