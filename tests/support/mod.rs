#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use taskmate::config::{ServerConfig, TasksConfig};
use taskmate::scope::Scope;
use taskmate::server::Server;
use taskmate::storage::{Storage, TASKS_FILE};
use taskmate::task::TaskStore;
use tempfile::TempDir;

pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::new(Storage::new(self.path()), TasksConfig::default())
    }

    pub fn server(&self) -> Server {
        Server::new(self.store(), ServerConfig::default())
    }

    pub fn tasks_path(&self, scope: &Scope) -> PathBuf {
        let mut path = self.path().to_path_buf();
        for segment in scope.segments() {
            path.push(segment);
        }
        path.join(TASKS_FILE)
    }

    /// Seed a scope with a raw JSON document
    pub fn write_tasks(&self, scope: &Scope, document: &Value) -> std::io::Result<PathBuf> {
        self.write_raw(scope, &serde_json::to_string_pretty(document)?)
    }

    pub fn write_raw(&self, scope: &Scope, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.tasks_path(scope);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_tasks(&self, scope: &Scope) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.tasks_path(scope))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// A stored task document with only the fields the store requires
pub fn task_json(id: u64, title: &str, priority: i64, status: &str) -> Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "",
        "priority": priority,
        "status": status,
        "progress": 0,
        "subtasks": []
    })
}
