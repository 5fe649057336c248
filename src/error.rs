//! Error types for taskmate
//!
//! Exit codes:
//! - 0: Success
//! - 2: Caller error (bad arguments, unknown task, unknown tool or resource)
//! - 4: Operation failed (storage write, I/O, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskmate CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskmate operations
#[derive(Error, Debug)]
pub enum Error {
    // Caller errors (exit code 2)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task (ID: {0}) not found")]
    TaskNotFound(u64),

    #[error("Subtask (ID: {subtask_id}) not found in task (ID: {task_id})")]
    SubtaskNotFound { task_id: u64, subtask_id: u64 },

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("Failed to save tasks to {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::TaskNotFound(_)
            | Error::SubtaskNotFound { .. }
            | Error::UnknownOperation(_)
            | Error::InvalidArguments(_)
            | Error::UnknownResource(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Storage { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Errors that tool dispatch reports as ordinary result content instead of raising.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::TaskNotFound(_) | Error::SubtaskNotFound { .. }
        )
    }

    /// Structured fields for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(message)
            | Error::InvalidArguments(message)
            | Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::TaskNotFound(task_id) => Some(serde_json::json!({ "task_id": task_id })),
            Error::SubtaskNotFound {
                task_id,
                subtask_id,
            } => Some(serde_json::json!({
                "task_id": task_id,
                "subtask_id": subtask_id,
            })),
            Error::UnknownOperation(name) => Some(serde_json::json!({ "tool": name })),
            Error::UnknownResource(uri) => Some(serde_json::json!({ "uri": uri })),
            Error::Storage { path, .. } => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskmate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
