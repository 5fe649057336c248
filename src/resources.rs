//! Read-only task views addressed by URI.
//!
//! ```text
//! <scheme>://tasks/<view>
//! <scheme>://<agent>/tasks/<view>
//! <scheme>://<agent>/<project>/tasks/<view>
//! ```
//!
//! where `<view>` is `all`, `pending` or `completed`.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::task::{TaskStore, TaskView};

pub const JSON_MIME: &str = "application/json";

const TASKS_SEGMENT: &str = "tasks";

/// Resource entry for the protocol listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDef {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// A parsed resource address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub scope: Scope,
    pub view: TaskView,
}

impl ResourceUri {
    pub fn new(scope: Scope, view: TaskView) -> Self {
        Self { scope, view }
    }

    /// Parse `uri` against `scheme`; any mismatch is `UnknownResource(uri)`.
    pub fn parse(scheme: &str, uri: &str) -> Result<Self> {
        let unknown = || Error::UnknownResource(uri.to_string());

        let rest = uri
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .ok_or_else(unknown)?;
        let segments: Vec<&str> = rest.split('/').collect();

        let (scope_segments, tail) = match segments.len() {
            2..=4 => segments.split_at(segments.len() - 2),
            _ => return Err(unknown()),
        };
        if tail[0] != TASKS_SEGMENT {
            return Err(unknown());
        }
        let view = TaskView::parse(tail[1]).ok_or_else(unknown)?;

        let scope = match scope_segments {
            [] => Scope::root(),
            [agent] => Scope::agent(*agent),
            [agent, project] => Scope::agent(*agent).with_project(*project),
            _ => return Err(unknown()),
        };
        // "taskmate:///tasks/all" and friends must not silently degrade to root
        if scope.segments().count() != scope_segments.len() || scope.validate().is_err() {
            return Err(unknown());
        }

        Ok(Self { scope, view })
    }

    pub fn to_uri(&self, scheme: &str) -> String {
        let mut uri = format!("{scheme}://");
        for segment in self.scope.segments() {
            uri.push_str(segment);
            uri.push('/');
        }
        uri.push_str(TASKS_SEGMENT);
        uri.push('/');
        uri.push_str(self.view.as_str());
        uri
    }

    fn describe(&self, scheme: &str) -> ResourceDef {
        let (name, what) = match self.view {
            TaskView::All => ("All Tasks", "Complete list of all tasks"),
            TaskView::Pending => ("Pending Tasks", "List of tasks not yet completed"),
            TaskView::Completed => ("Completed Tasks", "List of completed tasks"),
        };
        let (name, description) = match (self.scope.agent_id(), self.scope.project_name()) {
            (None, _) => (name.to_string(), what.to_string()),
            (Some(agent), None) => (
                format!("{name} for {agent}"),
                format!("{what} for agent {agent}"),
            ),
            (Some(agent), Some(project)) => (
                format!("{name} for {agent}/{project}"),
                format!("{what} for agent {agent} in project {project}"),
            ),
        };
        ResourceDef {
            uri: self.to_uri(scheme),
            name,
            description,
            mime_type: JSON_MIME,
        }
    }
}

/// Every view of the root scope, each agent, and each agent's projects
pub fn list_resources(store: &TaskStore, scheme: &str) -> Vec<ResourceDef> {
    let storage = store.storage();
    let mut scopes = vec![Scope::root()];
    for agent in storage.list_agents() {
        let projects = storage.list_projects(&agent);
        scopes.push(Scope::agent(agent.clone()));
        scopes.extend(
            projects
                .into_iter()
                .map(|project| Scope::agent(agent.clone()).with_project(project)),
        );
    }

    scopes
        .into_iter()
        .flat_map(|scope| {
            TaskView::ALL
                .into_iter()
                .map(move |view| ResourceUri::new(scope.clone(), view))
        })
        .map(|resource| resource.describe(scheme))
        .collect()
}

/// Render the tasks behind `uri` as pretty JSON
pub fn read_resource(store: &TaskStore, scheme: &str, uri: &str) -> Result<String> {
    let resource = ResourceUri::parse(scheme, uri)?;
    tracing::debug!(uri, scope = %resource.scope, "reading resource");
    let tasks = store.view(&resource.scope, resource.view)?;
    Ok(serde_json::to_string_pretty(&tasks)?)
}
