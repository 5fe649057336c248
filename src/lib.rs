//! taskmate - Task Tracking Library
//!
//! This library provides the core functionality behind the taskmate server:
//! hierarchical task lists that several agents can read and update through
//! a tool/resource protocol.
//!
//! # Core Concepts
//!
//! - **Scopes**: root, agent, or agent + project; each owns one task collection
//! - **Tasks**: priority, progress-derived status, subtasks and notes
//! - **Tools**: named operations taking a JSON argument mapping
//! - **Resources**: read-only filtered views addressed by URI
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskmate.toml`
//! - `error`: Error types and result aliases
//! - `output`: Human and JSON output for CLI commands
//! - `resources`: Resource URIs, listing and reading
//! - `scope`: Scope addressing and segment validation
//! - `server`: Stdio JSON-RPC loop
//! - `storage`: Per-scope JSON documents and atomic writes
//! - `task`: Task model, rules, and the task store
//! - `tools`: Tool catalogue, argument parsing and dispatch

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod resources;
pub mod scope;
pub mod server;
pub mod storage;
pub mod task;
pub mod tools;

pub use error::{Error, Result};
