//! taskmate resources / read command implementation

use serde_json::Value;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::resources::{list_resources, read_resource};

pub fn run_list(context: Context) -> Result<()> {
    let resources = list_resources(&context.store, &context.config.server.uri_scheme);

    let mut human = HumanOutput::new(format!("Resources ({})", resources.len()));
    for resource in &resources {
        human.push_detail(format!("{} ({})", resource.uri, resource.name));
    }

    emit_success(context.output, "resources", &resources, Some(&human))
}

pub fn run_read(context: Context, uri: &str) -> Result<()> {
    let text = read_resource(&context.store, &context.config.server.uri_scheme, uri)?;
    let tasks: Value = serde_json::from_str(&text)?;

    let human = HumanOutput::new(text);
    emit_success(context.output, "read", &tasks, Some(&human))
}
