//! taskmate init command implementation
//!
//! Writes a config file (unless one exists) and creates the storage root.

use std::path::PathBuf;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct InitReport {
    config: PathBuf,
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    root: bool,
}

pub fn run(context: Context) -> Result<()> {
    let root = context.store.storage().root().to_path_buf();

    let created_config = !context.config_path.exists();
    if created_config {
        let mut config = context.config.clone();
        config.storage.root = root.clone();
        config.save(&context.config_path)?;
    }

    let created_root = !root.is_dir();
    std::fs::create_dir_all(&root)?;
    tracing::info!(
        config = %context.config_path.display(),
        root = %root.display(),
        "initialized"
    );

    let mut human = HumanOutput::new("taskmate init");
    human.push_summary("config", context.config_path.display().to_string());
    human.push_summary("root", root.display().to_string());
    if !created_config {
        human.push_warning(format!(
            "{} already exists, left unchanged",
            context.config_path.display()
        ));
    }

    let report = InitReport {
        config: context.config_path,
        root,
        created: InitCreated {
            config: created_config,
            root: created_root,
        },
    };
    emit_success(context.output, "init", &report, Some(&human))
}
