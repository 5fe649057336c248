//! Tool catalogue and dispatch.
//!
//! Callers hand in a tool name plus an untyped argument mapping. Each tool
//! has one typed request variant; arguments are checked and converted while
//! building it, so the task operations only ever see well-formed input.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::task::{NewTask, TaskFilter, TaskStatus, TaskStore};

pub const LIST_AGENTS: &str = "list_agents";
pub const LIST_PROJECTS: &str = "list_projects";
pub const GET_TASKS: &str = "get_tasks";
pub const GET_NEXT_TASK: &str = "get_next_task";
pub const CREATE_TASK: &str = "create_task";
pub const UPDATE_PROGRESS: &str = "update_progress";
pub const COMPLETE_TASK: &str = "complete_task";
pub const ADD_SUBTASK: &str = "add_subtask";
pub const UPDATE_SUBTASK: &str = "update_subtask";
pub const ADD_NOTE: &str = "add_note";

pub const TOOL_NAMES: [&str; 10] = [
    LIST_AGENTS,
    LIST_PROJECTS,
    GET_TASKS,
    GET_NEXT_TASK,
    CREATE_TASK,
    UPDATE_PROGRESS,
    COMPLETE_TASK,
    ADD_SUBTASK,
    UPDATE_SUBTASK,
    ADD_NOTE,
];

const NO_TASKS_AVAILABLE: &str =
    "No tasks available. All tasks are done or none have been created yet.";

/// Tool definition for the protocol manifest
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One item of tool output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// Result of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<Content>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: true,
        }
    }

    /// All text items joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ListAgents,
    ListProjects {
        agent_id: String,
    },
    GetTasks {
        scope: Scope,
        filter: TaskFilter,
    },
    GetNextTask {
        scope: Scope,
    },
    CreateTask {
        scope: Scope,
        task: NewTask,
    },
    UpdateProgress {
        scope: Scope,
        task_id: u64,
        progress: f64,
    },
    CompleteTask {
        scope: Scope,
        task_id: u64,
    },
    AddSubtask {
        scope: Scope,
        task_id: u64,
        description: String,
    },
    UpdateSubtask {
        scope: Scope,
        task_id: u64,
        subtask_id: u64,
        status: TaskStatus,
    },
    AddNote {
        scope: Scope,
        task_id: u64,
        content: String,
    },
}

impl ToolRequest {
    /// Build a request from a tool name and its raw arguments.
    ///
    /// Unknown names fail with `UnknownOperation`, non-object arguments with
    /// `InvalidArguments`; everything else that is wrong is a `Validation` error.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self> {
        if !TOOL_NAMES.contains(&name) {
            return Err(Error::UnknownOperation(name.to_string()));
        }
        let args = Args::new(arguments)?;

        let request = match name {
            LIST_AGENTS => ToolRequest::ListAgents,
            LIST_PROJECTS => ToolRequest::ListProjects {
                agent_id: args.required_str("agent_id")?,
            },
            GET_TASKS => ToolRequest::GetTasks {
                scope: args.scope()?,
                filter: TaskFilter {
                    status: args.optional_status("status")?,
                    priority_min: args.optional_int("priority_min")?,
                },
            },
            GET_NEXT_TASK => ToolRequest::GetNextTask {
                scope: args.scope()?,
            },
            CREATE_TASK => ToolRequest::CreateTask {
                scope: args.scope()?,
                task: NewTask {
                    title: args.required_str("title")?,
                    description: args.required_str("description")?,
                    priority: args.optional_int("priority")?,
                    subtasks: args.optional_str_list("subtasks")?,
                },
            },
            UPDATE_PROGRESS => ToolRequest::UpdateProgress {
                scope: args.scope()?,
                task_id: args.required_id("task_id")?,
                progress: args.required_number("progress")?,
            },
            COMPLETE_TASK => ToolRequest::CompleteTask {
                scope: args.scope()?,
                task_id: args.required_id("task_id")?,
            },
            ADD_SUBTASK => ToolRequest::AddSubtask {
                scope: args.scope()?,
                task_id: args.required_id("task_id")?,
                description: args.required_str("description")?,
            },
            UPDATE_SUBTASK => ToolRequest::UpdateSubtask {
                scope: args.scope()?,
                task_id: args.required_id("task_id")?,
                subtask_id: args.required_id("subtask_id")?,
                status: args
                    .optional_status("status")?
                    .ok_or_else(|| missing("status"))?,
            },
            ADD_NOTE => ToolRequest::AddNote {
                scope: args.scope()?,
                task_id: args.required_id("task_id")?,
                content: args.required_str("content")?,
            },
            _ => return Err(Error::UnknownOperation(name.to_string())),
        };

        Ok(request)
    }

    /// Run the request against the store
    pub fn execute(self, store: &TaskStore) -> Result<ToolOutput> {
        match self {
            ToolRequest::ListAgents => Ok(ToolOutput::success(to_json(
                &store.storage().list_agents(),
            )?)),
            ToolRequest::ListProjects { agent_id } => Ok(ToolOutput::success(to_json(
                &store.storage().list_projects(&agent_id),
            )?)),
            ToolRequest::GetTasks { scope, filter } => {
                let tasks = store.list(&scope, &filter)?;
                Ok(ToolOutput::success(to_json(&tasks)?))
            }
            ToolRequest::GetNextTask { scope } => match store.next(&scope)? {
                Some(task) => Ok(ToolOutput::success(to_json(&task)?)),
                None => Ok(ToolOutput::success(NO_TASKS_AVAILABLE)),
            },
            ToolRequest::CreateTask { scope, task } => {
                let created = store.create(&scope, task)?;
                Ok(ToolOutput::success(format!(
                    "Task '{}' (ID: {}){} created.",
                    created.title,
                    created.id,
                    scope_suffix(&scope)
                )))
            }
            ToolRequest::UpdateProgress {
                scope,
                task_id,
                progress,
            } => {
                store.update_progress(&scope, task_id, progress)?;
                Ok(ToolOutput::success(format!(
                    "Task (ID: {task_id}) progress updated to {progress}%."
                )))
            }
            ToolRequest::CompleteTask { scope, task_id } => {
                store.complete(&scope, task_id)?;
                Ok(ToolOutput::success(format!(
                    "Task (ID: {task_id}) marked as done."
                )))
            }
            ToolRequest::AddSubtask {
                scope,
                task_id,
                description,
            } => {
                let subtask = store.add_subtask(&scope, task_id, &description)?;
                Ok(ToolOutput::success(format!(
                    "Subtask (ID: {}) added to task (ID: {task_id}).",
                    subtask.id
                )))
            }
            ToolRequest::UpdateSubtask {
                scope,
                task_id,
                subtask_id,
                status,
            } => {
                store.update_subtask(&scope, task_id, subtask_id, status)?;
                Ok(ToolOutput::success(format!(
                    "Subtask (ID: {subtask_id}) status updated to '{status}'."
                )))
            }
            ToolRequest::AddNote {
                scope,
                task_id,
                content,
            } => {
                store.add_note(&scope, task_id, &content)?;
                Ok(ToolOutput::success(format!(
                    "Note added to task (ID: {task_id})."
                )))
            }
        }
    }
}

/// Invoke a tool by name.
///
/// Validation and not-found failures come back as `is_error` output.
/// Unknown tools, non-object arguments and storage failures are raised.
/// Anything else is reported as an unexpected-error output so a single bad
/// call never takes the caller down.
pub fn call_tool(store: &TaskStore, name: &str, arguments: &Value) -> Result<ToolOutput> {
    tracing::debug!(tool = name, "dispatching tool call");
    let outcome = ToolRequest::parse(name, arguments).and_then(|request| request.execute(store));
    match outcome {
        Ok(output) => Ok(output),
        Err(err) if err.is_reportable() => {
            tracing::debug!(tool = name, error = %err, "tool call rejected");
            Ok(ToolOutput::failure(format!("Error: {err}")))
        }
        Err(
            err @ (Error::UnknownOperation(_) | Error::InvalidArguments(_) | Error::Storage { .. }),
        ) => Err(err),
        Err(err) => {
            tracing::error!(tool = name, error = %err, "unexpected tool failure");
            Ok(ToolOutput::failure(format!("Unexpected error: {err}")))
        }
    }
}

/// Catalogue of every tool with its input schema
pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: LIST_AGENTS,
            description: "List the agents that have task collections.",
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDef {
            name: LIST_PROJECTS,
            description: "List the projects of one agent.",
            input_schema: object_schema(
                json!({
                    "agent_id": { "type": "string", "description": "Agent ID" }
                }),
                &["agent_id"],
            ),
        },
        ToolDef {
            name: GET_TASKS,
            description: "Get the current task list, optionally filtered by status or minimum priority.",
            input_schema: scoped_schema(
                json!({
                    "status": status_schema("Task status"),
                    "priority_min": {
                        "type": "integer",
                        "description": "Minimum priority (1-5)",
                        "minimum": 1,
                        "maximum": 5
                    }
                }),
                &[],
            ),
        },
        ToolDef {
            name: GET_NEXT_TASK,
            description: "Get the highest-priority pending task and mark it 'in_progress'.",
            input_schema: scoped_schema(json!({}), &[]),
        },
        ToolDef {
            name: CREATE_TASK,
            description: "Create a new task, optionally with subtasks.",
            input_schema: scoped_schema(
                json!({
                    "title": { "type": "string", "description": "Task title" },
                    "description": { "type": "string", "description": "Detailed task description" },
                    "priority": {
                        "type": "integer",
                        "description": "Task priority (1-5, 5 is highest)",
                        "minimum": 1,
                        "maximum": 5,
                        "default": 3
                    },
                    "subtasks": {
                        "type": "array",
                        "description": "Subtask descriptions",
                        "items": { "type": "string" }
                    }
                }),
                &["title", "description"],
            ),
        },
        ToolDef {
            name: UPDATE_PROGRESS,
            description: "Update a task's progress; status follows from the new value.",
            input_schema: scoped_schema(
                json!({
                    "task_id": { "type": "integer", "description": "Task ID" },
                    "progress": {
                        "type": "number",
                        "description": "Progress percentage (0-100)",
                        "minimum": 0,
                        "maximum": 100
                    }
                }),
                &["task_id", "progress"],
            ),
        },
        ToolDef {
            name: COMPLETE_TASK,
            description: "Mark a task as done.",
            input_schema: scoped_schema(
                json!({
                    "task_id": { "type": "integer", "description": "Task ID" }
                }),
                &["task_id"],
            ),
        },
        ToolDef {
            name: ADD_SUBTASK,
            description: "Add a subtask to an existing task.",
            input_schema: scoped_schema(
                json!({
                    "task_id": { "type": "integer", "description": "Parent task ID" },
                    "description": { "type": "string", "description": "Subtask description" }
                }),
                &["task_id", "description"],
            ),
        },
        ToolDef {
            name: UPDATE_SUBTASK,
            description: "Update a subtask's status and recompute the parent task's progress.",
            input_schema: scoped_schema(
                json!({
                    "task_id": { "type": "integer", "description": "Parent task ID" },
                    "subtask_id": { "type": "integer", "description": "Subtask ID" },
                    "status": status_schema("New subtask status")
                }),
                &["task_id", "subtask_id", "status"],
            ),
        },
        ToolDef {
            name: ADD_NOTE,
            description: "Add a timestamped note to a task.",
            input_schema: scoped_schema(
                json!({
                    "task_id": { "type": "integer", "description": "Task ID" },
                    "content": { "type": "string", "description": "Note content" }
                }),
                &["task_id", "content"],
            ),
        },
    ]
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn scoped_schema(mut properties: Value, required: &[&str]) -> Value {
    if let Value::Object(map) = &mut properties {
        map.insert(
            "agent_id".to_string(),
            json!({ "type": "string", "description": "Target agent ID" }),
        );
        map.insert(
            "project_name".to_string(),
            json!({ "type": "string", "description": "Target project name" }),
        );
    }
    object_schema(properties, required)
}

fn status_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{description} ('todo', 'in_progress', 'done')"),
        "enum": ["todo", "in_progress", "done"]
    })
}

fn scope_suffix(scope: &Scope) -> String {
    let mut suffix = String::new();
    if let Some(agent) = scope.agent_id() {
        suffix.push_str(&format!(" (agent: {agent})"));
    }
    if let Some(project) = scope.project_name() {
        suffix.push_str(&format!(" (project: {project})"));
    }
    suffix
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn missing(field: &str) -> Error {
    Error::Validation(format!("missing required parameter: {field}"))
}

fn wrong_type(field: &str, expected: &str) -> Error {
    Error::Validation(format!("parameter {field} must be {expected}"))
}

/// Typed accessors over a raw argument object. `null` counts as absent.
struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn new(arguments: &'a Value) -> Result<Self> {
        match arguments {
            Value::Object(map) => Ok(Self { map }),
            _ => Err(Error::InvalidArguments(
                "arguments must be an object".to_string(),
            )),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key, "a string")),
        }
    }

    fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?.ok_or_else(|| missing(key))
    }

    fn optional_int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| wrong_type(key, "an integer")),
        }
    }

    fn required_id(&self, key: &str) -> Result<u64> {
        match self.get(key) {
            None => Err(missing(key)),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| wrong_type(key, "a non-negative integer")),
        }
    }

    fn required_number(&self, key: &str) -> Result<f64> {
        match self.get(key) {
            None => Err(missing(key)),
            Some(value) => value.as_f64().ok_or_else(|| wrong_type(key, "a number")),
        }
    }

    /// Empty strings mean "no status"
    fn optional_status(&self, key: &str) -> Result<Option<TaskStatus>> {
        match self.optional_str(key)? {
            None => Ok(None),
            Some(value) if value.is_empty() => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }

    fn optional_str_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| wrong_type(key, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(wrong_type(key, "a list of strings")),
        }
    }

    fn scope(&self) -> Result<Scope> {
        let scope = Scope::from_parts(
            self.optional_str("agent_id")?,
            self.optional_str("project_name")?,
        );
        scope.validate()?;
        Ok(scope)
    }
}
