//! Scope addressing for task collections.
//!
//! A scope selects one task collection: the root collection, an agent's
//! collection, or a project collection nested under an agent. A project
//! name without an agent carries no meaning and is dropped, so the scope
//! degrades to root.

use std::fmt;

use crate::error::{Error, Result};
use crate::storage::TASKS_FILE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    agent_id: Option<String>,
    project_name: Option<String>,
}

impl Scope {
    /// The unscoped root collection
    pub fn root() -> Self {
        Self::default()
    }

    /// An agent's own collection
    pub fn agent(agent_id: impl Into<String>) -> Self {
        Self::from_parts(Some(agent_id.into()), None)
    }

    /// Narrow an agent scope to one of its projects. Ignored on the root scope.
    pub fn with_project(mut self, project_name: impl Into<String>) -> Self {
        if self.agent_id.is_some() {
            self.project_name = non_empty(Some(project_name.into()));
        }
        self
    }

    /// Build a scope from optional request parameters.
    ///
    /// Empty strings count as absent.
    pub fn from_parts(agent_id: Option<String>, project_name: Option<String>) -> Self {
        let agent_id = non_empty(agent_id);
        let project_name = match agent_id {
            Some(_) => non_empty(project_name),
            None => None,
        };
        Self {
            agent_id,
            project_name,
        }
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// Directory segments below the storage root, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.agent_id
            .as_deref()
            .into_iter()
            .chain(self.project_name.as_deref())
    }

    /// Reject components that would escape the storage root
    pub fn validate(&self) -> Result<()> {
        if let Some(agent_id) = self.agent_id() {
            validate_segment("agent_id", agent_id)?;
        }
        if let Some(project_name) = self.project_name() {
            validate_segment("project_name", project_name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.agent_id(), self.project_name()) {
            (None, _) => f.write_str("<root>"),
            (Some(agent), None) => f.write_str(agent),
            (Some(agent), Some(project)) => write!(f, "{agent}/{project}"),
        }
    }
}

/// True when `value` can be used as a single directory name under the root.
///
/// The collection file name is reserved: a scope directory with that name
/// would sit where its parent's document lives.
pub fn is_valid_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value != TASKS_FILE
        && !value.contains('/')
        && !value.contains('\\')
        && !value.contains('\0')
}

fn validate_segment(field: &str, value: &str) -> Result<()> {
    if is_valid_segment(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{field} must be a single path segment, got '{value}'"
        )))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
