//! taskmate tools / call command implementation
//!
//! `call` runs the typed request directly, so a failing tool surfaces as a
//! CLI error with the matching exit code rather than as error content.

use serde_json::Value;

use super::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::tools::{tool_definitions, ToolRequest};

/// Options for `taskmate call`
pub struct CallOptions {
    pub name: String,
    pub args: String,
}

pub fn run_list(context: Context) -> Result<()> {
    let tools = tool_definitions();

    let mut human = HumanOutput::new(format!("Tools ({})", tools.len()));
    for tool in &tools {
        human.push_detail(format!("{}: {}", tool.name, tool.description));
    }

    emit_success(context.output, "tools", &tools, Some(&human))
}

pub fn run_call(context: Context, options: CallOptions) -> Result<()> {
    let arguments: Value = serde_json::from_str(&options.args)
        .map_err(|err| Error::InvalidArguments(format!("--args is not valid JSON: {err}")))?;

    let request = ToolRequest::parse(&options.name, &arguments)?;
    let output = request.execute(&context.store)?;

    let human = HumanOutput::new(output.text());
    emit_success(context.output, &options.name, &output, Some(&human))
}
