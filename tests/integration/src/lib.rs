//! End-to-end synthesis tests for trailstack.
//!
//! Each test declares a stack through the public API, synthesizes it, and
//! inspects the rendered template JSON.
//!
//! ```text
//! cargo test -p trailstack-integration
//! ```

use std::sync::Once;

use serde_json::Value;
use trailstack_synth::{AuditTrailStack, StackProps};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Declare the audit trail stack under `id`.
#[must_use]
pub fn audit_stack(id: &str, props: StackProps) -> AuditTrailStack {
    init_tracing();
    AuditTrailStack::new(id, props).unwrap_or_else(|e| panic!("failed to declare {id}: {e}"))
}

/// Synthesize the audit trail stack under `id` into template JSON.
#[must_use]
pub fn audit_template(id: &str, props: StackProps) -> Value {
    let stack = audit_stack(id, props);
    let template = stack
        .synth()
        .unwrap_or_else(|e| panic!("failed to synthesize {id}: {e}"));
    template
        .to_value()
        .unwrap_or_else(|e| panic!("failed to render {id}: {e}"))
}

/// Logical ids and bodies of the template's resources of type `resource_type`.
#[must_use]
pub fn resources_of_type<'a>(template: &'a Value, resource_type: &str) -> Vec<(&'a str, &'a Value)> {
    template["Resources"]
        .as_object()
        .map(|resources| {
            resources
                .iter()
                .filter(|(_, r)| r["Type"] == resource_type)
                .map(|(id, r)| (id.as_str(), r))
                .collect()
        })
        .unwrap_or_default()
}

mod test_audit_stack;
mod test_generic_stack;
mod test_properties;
