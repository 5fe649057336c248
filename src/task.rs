//! Task management for taskmate.
//!
//! A scope's tasks live in one JSON array (see [`crate::storage`]). Every
//! operation loads the whole collection, transforms it in memory and, for
//! mutations, writes it back in one piece. Task status is derived from
//! progress or subtask completion; there is no direct status setter.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::storage::Storage;

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 5;
pub const DEFAULT_PRIORITY: i64 = 3;

fn default_task_priority() -> i64 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "invalid status '{value}': must be 'todo', 'in_progress', or 'done'"
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub content: String,
    /// ISO-8601 capture time, kept verbatim as read
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_priority")]
    pub priority: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, serialize_with = "serialize_progress")]
    pub progress: f64,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    /// Keys this crate does not model, kept so hand-edited documents round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whole-number progress is written as an integer (`75`, not `75.0`).
fn serialize_progress<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status != TaskStatus::Done
    }

    /// Set progress and derive status from it.
    ///
    /// 100 or more is done, anything between 0 and 100 is in progress, and
    /// exactly 0 leaves the status alone.
    pub fn apply_progress(&mut self, progress: f64) {
        self.progress = progress;
        if progress >= 100.0 {
            self.status = TaskStatus::Done;
        } else if progress > 0.0 {
            self.status = TaskStatus::InProgress;
        }
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Done;
        self.progress = 100.0;
    }

    /// Recompute progress and status from subtask completion.
    ///
    /// No-op for a task without subtasks.
    pub fn recompute_from_subtasks(&mut self) {
        let total = self.subtasks.len();
        if total == 0 {
            return;
        }
        let done = self
            .subtasks
            .iter()
            .filter(|subtask| subtask.status == TaskStatus::Done)
            .count();
        self.progress = (done as f64 / total as f64 * 100.0).round();
        if done == total {
            self.status = TaskStatus::Done;
        } else if done > 0 {
            self.status = TaskStatus::InProgress;
        }
    }

    fn subtask_mut(&mut self, subtask_id: u64) -> Result<&mut Subtask> {
        let task_id = self.id;
        self.subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
            .ok_or(Error::SubtaskNotFound {
                task_id,
                subtask_id,
            })
    }
}

// =============================================================================
// Identity allocation
// =============================================================================

/// Next task id: one past the highest id in the collection, or 1 when empty
pub fn next_task_id(tasks: &[Task]) -> u64 {
    tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1
}

/// Next subtask id within one task, same rule as [`next_task_id`]
pub fn next_subtask_id(subtasks: &[Subtask]) -> u64 {
    subtasks.iter().map(|subtask| subtask.id).max().unwrap_or(0) + 1
}

/// Next note id: existing note count plus one.
// Count-based, unlike task and subtask ids. Collides if notes are ever deleted.
pub fn next_note_id(notes: &[Note]) -> u64 {
    notes.len() as u64 + 1
}

// =============================================================================
// Queries
// =============================================================================

/// Filters accepted by `get_tasks`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority_min: Option<i64>,
}

impl TaskFilter {
    pub fn validate(&self) -> Result<()> {
        if let Some(min) = self.priority_min {
            validate_priority("priority_min", min)?;
        }
        Ok(())
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.priority_min.map_or(true, |min| task.priority >= min)
    }
}

/// Predefined views exposed as resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskView {
    All,
    Pending,
    Completed,
}

impl TaskView {
    pub const ALL: [TaskView; 3] = [TaskView::All, TaskView::Pending, TaskView::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskView::All => "all",
            TaskView::Pending => "pending",
            TaskView::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        TaskView::ALL.into_iter().find(|view| view.as_str() == value)
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskView::All => true,
            TaskView::Pending => matches!(task.status, TaskStatus::Todo | TaskStatus::InProgress),
            TaskView::Completed => task.status == TaskStatus::Done,
        }
    }
}

/// Index of the pending task with the highest priority.
///
/// Ties go to the task that comes first in the collection.
pub fn select_next(tasks: &[Task]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, task) in tasks.iter().enumerate() {
        if !task.is_pending() {
            continue;
        }
        match best {
            Some((_, priority)) if task.priority <= priority => {}
            _ => best = Some((index, task.priority)),
        }
    }
    best.map(|(index, _)| index)
}

// =============================================================================
// Mutations
// =============================================================================

/// Input for `create_task`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Option<i64>,
    pub subtasks: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn subtasks<I, S>(mut self, subtasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks = subtasks.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        if let Some(priority) = self.priority {
            validate_priority("priority", priority)?;
        }
        Ok(())
    }

    fn into_task(self, id: u64, default_priority: i64) -> Task {
        let subtasks = self
            .subtasks
            .into_iter()
            .zip(1..)
            .map(|(description, id)| Subtask {
                id,
                description,
                status: TaskStatus::Todo,
                extra: Map::new(),
            })
            .collect();
        Task {
            id,
            title: self.title,
            description: self.description,
            priority: self.priority.unwrap_or(default_priority),
            status: TaskStatus::Todo,
            progress: 0.0,
            subtasks,
            notes: Some(Vec::new()),
            extra: Map::new(),
        }
    }
}

/// Replace the task with `task_id` by the result of `update`, keeping its position.
fn replace_task<F, T>(tasks: &mut [Task], task_id: u64, update: F) -> Result<T>
where
    F: FnOnce(&mut Task) -> Result<T>,
{
    let index = tasks
        .iter()
        .position(|task| task.id == task_id)
        .ok_or(Error::TaskNotFound(task_id))?;
    let mut updated = tasks[index].clone();
    let out = update(&mut updated)?;
    tasks[index] = updated;
    Ok(out)
}

fn validate_priority(field: &str, priority: i64) -> Result<()> {
    if (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{field} must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        )))
    }
}

fn validate_progress(progress: f64) -> Result<()> {
    if progress.is_finite() && (0.0..=100.0).contains(&progress) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "progress must be between 0 and 100, got {progress}"
        )))
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

// =============================================================================
// Store
// =============================================================================

/// Scope-aware task operations over [`Storage`]
#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(storage: Storage, config: TasksConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    /// Tasks in scope matching `filter`, in collection order
    pub fn list(&self, scope: &Scope, filter: &TaskFilter) -> Result<Vec<Task>> {
        filter.validate()?;
        let mut tasks = self.load(scope)?;
        tasks.retain(|task| filter.matches(task));
        Ok(tasks)
    }

    /// Tasks in scope matching a resource view
    pub fn view(&self, scope: &Scope, view: TaskView) -> Result<Vec<Task>> {
        let mut tasks = self.load(scope)?;
        tasks.retain(|task| view.matches(task));
        Ok(tasks)
    }

    /// Pick the highest-priority pending task and mark it in progress.
    ///
    /// Returns `None` when every task is done or the scope is empty.
    pub fn next(&self, scope: &Scope) -> Result<Option<Task>> {
        let mut tasks = self.load(scope)?;
        let Some(index) = select_next(&tasks) else {
            tracing::debug!(scope = %scope, "no pending tasks");
            return Ok(None);
        };
        tasks[index].status = TaskStatus::InProgress;
        let picked = tasks[index].clone();
        self.storage.save_tasks(scope, &tasks)?;
        tracing::info!(scope = %scope, task_id = picked.id, "started next task");
        Ok(Some(picked))
    }

    pub fn create(&self, scope: &Scope, new_task: NewTask) -> Result<Task> {
        new_task.validate()?;
        let default_priority = self.config.default_priority;
        let task = self.mutate(scope, |tasks| {
            let task = new_task.into_task(next_task_id(tasks), default_priority);
            tasks.push(task.clone());
            Ok(task)
        })?;
        tracing::info!(scope = %scope, task_id = task.id, "created task");
        Ok(task)
    }

    pub fn update_progress(&self, scope: &Scope, task_id: u64, progress: f64) -> Result<Task> {
        validate_progress(progress)?;
        let task = self.mutate(scope, |tasks| {
            replace_task(tasks, task_id, |task| {
                task.apply_progress(progress);
                Ok(task.clone())
            })
        })?;
        tracing::info!(scope = %scope, task_id, progress, status = %task.status, "updated progress");
        Ok(task)
    }

    pub fn complete(&self, scope: &Scope, task_id: u64) -> Result<Task> {
        let task = self.mutate(scope, |tasks| {
            replace_task(tasks, task_id, |task| {
                task.complete();
                Ok(task.clone())
            })
        })?;
        tracing::info!(scope = %scope, task_id, "completed task");
        Ok(task)
    }

    pub fn add_subtask(&self, scope: &Scope, task_id: u64, description: &str) -> Result<Subtask> {
        require_text("description", description)?;
        let subtask = self.mutate(scope, |tasks| {
            replace_task(tasks, task_id, |task| {
                let subtask = Subtask {
                    id: next_subtask_id(&task.subtasks),
                    description: description.to_string(),
                    status: TaskStatus::Todo,
                    extra: Map::new(),
                };
                task.subtasks.push(subtask.clone());
                Ok(subtask)
            })
        })?;
        tracing::info!(scope = %scope, task_id, subtask_id = subtask.id, "added subtask");
        Ok(subtask)
    }

    /// Set a subtask's status, then re-derive the parent's progress and status.
    ///
    /// Both changes land in a single write.
    pub fn update_subtask(
        &self,
        scope: &Scope,
        task_id: u64,
        subtask_id: u64,
        status: TaskStatus,
    ) -> Result<Task> {
        let task = self.mutate(scope, |tasks| {
            replace_task(tasks, task_id, |task| {
                task.subtask_mut(subtask_id)?.status = status;
                task.recompute_from_subtasks();
                Ok(task.clone())
            })
        })?;
        tracing::info!(
            scope = %scope,
            task_id,
            subtask_id,
            status = %status,
            progress = task.progress,
            "updated subtask"
        );
        Ok(task)
    }

    pub fn add_note(&self, scope: &Scope, task_id: u64, content: &str) -> Result<Note> {
        require_text("content", content)?;
        let note = self.mutate(scope, |tasks| {
            replace_task(tasks, task_id, |task| {
                let notes = task.notes.get_or_insert_with(Vec::new);
                let note = Note {
                    id: next_note_id(notes),
                    content: content.to_string(),
                    timestamp: now_timestamp(),
                    extra: Map::new(),
                };
                notes.push(note.clone());
                Ok(note)
            })
        })?;
        tracing::info!(scope = %scope, task_id, note_id = note.id, "added note");
        Ok(note)
    }

    fn load(&self, scope: &Scope) -> Result<Vec<Task>> {
        scope.validate()?;
        Ok(self.storage.load_tasks(scope))
    }

    /// Load, apply `f`, and persist only if `f` succeeds.
    fn mutate<T, F>(&self, scope: &Scope, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T>,
    {
        let mut tasks = self.load(scope)?;
        let out = f(&mut tasks)?;
        self.storage.save_tasks(scope, &tasks)?;
        Ok(out)
    }
}
