//! Command-line interface for taskmate
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::Storage;
use crate::task::TaskStore;

mod init;
mod resource;
mod scope;
mod serve;
mod tool;

/// taskmate - task tracking for cooperating agents
///
/// Serves per-agent, per-project task lists over a stdio tool/resource
/// protocol, and exposes the same operations as one-shot commands.
#[derive(Parser, Debug)]
#[command(name = "taskmate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for task storage (defaults to `output`)
    #[arg(long, global = true, env = "TASKMATE_ROOT")]
    pub root: Option<PathBuf>,

    /// Path to a config file (defaults to ./taskmate.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a taskmate.toml and create the storage root
    Init,

    /// Run the stdio protocol server
    Serve,

    /// List the tool catalogue
    Tools,

    /// Invoke a single tool
    Call {
        /// Tool name (see `taskmate tools`)
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// List resource URIs
    Resources,

    /// Print the tasks behind a resource URI
    Read {
        /// Resource URI, e.g. taskmate://alice/tasks/pending
        uri: String,
    },

    /// List agents with stored tasks
    Agents,

    /// List projects of an agent
    Projects {
        /// Agent identifier
        agent: String,
    },
}

/// Everything a command needs once globals are resolved
pub(crate) struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub store: TaskStore,
    pub output: OutputOptions,
}

impl Cli {
    fn context(&self) -> Result<Context> {
        let (config, config_path) = match &self.config {
            Some(path) if matches!(self.command, Commands::Init) && !path.exists() => {
                (Config::default(), path.clone())
            }
            Some(path) => (Config::load(path)?, path.clone()),
            None => {
                let cwd = std::env::current_dir()?;
                (Config::load_from_dir(&cwd), cwd.join(CONFIG_FILE))
            }
        };
        let root = self
            .root
            .clone()
            .unwrap_or_else(|| config.storage.root.clone());
        tracing::debug!(root = %root.display(), "resolved storage root");

        let store = TaskStore::new(Storage::new(root), config.tasks.clone());
        Ok(Context {
            config,
            config_path,
            store,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        })
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let context = self.context()?;
        match self.command {
            Commands::Init => init::run(context),
            Commands::Serve => serve::run(context),
            Commands::Tools => tool::run_list(context),
            Commands::Call { name, args } => tool::run_call(context, tool::CallOptions { name, args }),
            Commands::Resources => resource::run_list(context),
            Commands::Read { uri } => resource::run_read(context, &uri),
            Commands::Agents => scope::run_agents(context),
            Commands::Projects { agent } => scope::run_projects(context, &agent),
        }
    }
}
