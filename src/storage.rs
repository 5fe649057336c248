//! Storage layer for taskmate
//!
//! One JSON document per scope, laid out under a single root:
//!
//! ```text
//! <root>/
//!   tasks.json                  # root (unscoped) collection
//!   <agent_id>/
//!     tasks.json                # agent collection
//!     <project_name>/
//!       tasks.json              # project collection
//! ```
//!
//! Reads never fail: a missing, unreadable or unparsable document is treated
//! as an empty collection and the problem is logged. Writes replace the whole
//! document atomically and do fail loudly.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::scope::{is_valid_segment, Scope};
use crate::task::Task;

/// File name of every collection document
pub const TASKS_FILE: &str = "tasks.json";

/// Outcome of reading a collection document
#[derive(Debug)]
pub enum CollectionRead {
    /// No document exists yet for the scope
    Missing,
    /// Document parsed as a task array
    Loaded(Vec<Task>),
    /// Document (or its directory) could not be read
    Unreadable { path: PathBuf, reason: String },
    /// Document was read but is not a valid task array
    Corrupt { path: PathBuf, reason: String },
}

impl CollectionRead {
    /// Collapse to a task list, treating every failure as empty
    pub fn into_tasks(self) -> Vec<Task> {
        match self {
            CollectionRead::Loaded(tasks) => tasks,
            CollectionRead::Missing
            | CollectionRead::Unreadable { .. }
            | CollectionRead::Corrupt { .. } => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            CollectionRead::Unreadable { .. } | CollectionRead::Corrupt { .. }
        )
    }
}

/// Storage manager for task collections
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Path of the collection document for a scope (no side effects)
    pub fn collection_path(&self, scope: &Scope) -> PathBuf {
        let mut path = self.root.clone();
        for segment in scope.segments() {
            path.push(segment);
        }
        path.join(TASKS_FILE)
    }

    /// Resolve a scope to its document path, creating the directory chain.
    ///
    /// Idempotent; safe to call on every access.
    pub fn resolve(&self, scope: &Scope) -> Result<PathBuf> {
        scope.validate()?;
        let path = self.collection_path(scope);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    // =========================================================================
    // Collection I/O
    // =========================================================================

    /// Read a scope's collection, reporting how the read went
    pub fn read_collection(&self, scope: &Scope) -> CollectionRead {
        let path = match self.resolve(scope) {
            Ok(path) => path,
            Err(err) => {
                return CollectionRead::Unreadable {
                    path: self.collection_path(scope),
                    reason: err.to_string(),
                }
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return CollectionRead::Missing,
            Err(err) => {
                return CollectionRead::Unreadable {
                    path,
                    reason: err.to_string(),
                }
            }
        };

        match serde_json::from_str::<Vec<Task>>(&content) {
            Ok(tasks) => CollectionRead::Loaded(tasks),
            Err(err) => CollectionRead::Corrupt {
                path,
                reason: err.to_string(),
            },
        }
    }

    /// Load a scope's tasks; failures degrade to an empty collection
    pub fn load_tasks(&self, scope: &Scope) -> Vec<Task> {
        let read = self.read_collection(scope);
        match &read {
            CollectionRead::Loaded(tasks) => {
                tracing::debug!(scope = %scope, count = tasks.len(), "loaded tasks");
            }
            CollectionRead::Missing => {
                tracing::debug!(scope = %scope, "no task document yet");
            }
            CollectionRead::Unreadable { path, reason } => {
                tracing::warn!(
                    scope = %scope,
                    path = %path.display(),
                    reason = %reason,
                    "task document unreadable, treating as empty"
                );
            }
            CollectionRead::Corrupt { path, reason } => {
                tracing::warn!(
                    scope = %scope,
                    path = %path.display(),
                    reason = %reason,
                    "task document corrupt, treating as empty"
                );
            }
        }
        read.into_tasks()
    }

    /// Replace a scope's collection with `tasks`
    pub fn save_tasks(&self, scope: &Scope, tasks: &[Task]) -> Result<()> {
        let path = self.resolve(scope).map_err(|err| match err {
            Error::Io(source) => Error::Storage {
                path: self.collection_path(scope),
                source,
            },
            other => other,
        })?;
        let json = serde_json::to_string_pretty(tasks)?;
        write_atomic(&path, json.as_bytes()).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "failed to save tasks");
            Error::Storage {
                path: path.clone(),
                source,
            }
        })?;
        tracing::debug!(scope = %scope, count = tasks.len(), "saved tasks");
        Ok(())
    }

    // =========================================================================
    // Scope directory
    // =========================================================================

    /// Agents with a directory under the root, sorted by name
    pub fn list_agents(&self) -> Vec<String> {
        list_subdirectories(&self.root)
    }

    /// Projects with a directory under the agent, sorted by name.
    ///
    /// Unknown or malformed agents yield an empty list.
    pub fn list_projects(&self, agent_id: &str) -> Vec<String> {
        if !is_valid_segment(agent_id) {
            return Vec::new();
        }
        list_subdirectories(&self.root.join(agent_id))
    }
}

/// Write data atomically using temp file + rename
///
/// The temp file lives in the destination directory so the rename never
/// crosses file systems.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;

    Ok(())
}

fn list_subdirectories(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to list directory");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
