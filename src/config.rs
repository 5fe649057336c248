//! Configuration loading and management
//!
//! Handles parsing of `taskmate.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::task::{MAX_PRIORITY, MIN_PRIORITY};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "taskmate.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tasks configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Protocol server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where task collections live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the agent/project hierarchy
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority assigned by `create_task` when the caller omits one
    #[serde(default = "default_priority")]
    pub default_priority: i64,
}

fn default_priority() -> i64 {
    3
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

/// Protocol server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported during the initialize handshake
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Scheme used for resource URIs
    #[serde(default = "default_uri_scheme")]
    pub uri_scheme: String,
}

fn default_server_name() -> String {
    "taskmate-server".to_string()
}

fn default_uri_scheme() -> String {
    "taskmate".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            uri_scheme: default_uri_scheme(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskmate.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %err,
                        "ignoring unreadable config, using defaults"
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.tasks.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.default_priority) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.default_priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {}",
                self.default_priority
            )));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "server.name cannot be empty".to_string(),
            ));
        }
        let scheme = self.uri_scheme.trim();
        if scheme.is_empty() || scheme.contains(':') || scheme.contains('/') {
            return Err(crate::error::Error::InvalidConfig(format!(
                "server.uri_scheme is not a valid scheme: '{}'",
                self.uri_scheme
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.root, PathBuf::from("output"));
        assert_eq!(cfg.tasks.default_priority, 3);
        assert_eq!(cfg.server.name, "taskmate-server");
        assert_eq!(cfg.server.uri_scheme, "taskmate");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[storage]
root = "/var/lib/taskmate"

[tasks]
default_priority = 5

[server]
name = "tasks"
uri_scheme = "tm"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.storage.root, PathBuf::from("/var/lib/taskmate"));
        assert_eq!(cfg.tasks.default_priority, 5);
        assert_eq!(cfg.server.name, "tasks");
        assert_eq!(cfg.server.uri_scheme, "tm");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_priority = 1\n").expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.tasks.default_priority, 1);
        assert_eq!(cfg.storage.root, PathBuf::from("output"));
        assert_eq!(cfg.server.uri_scheme, "taskmate");
    }

    #[test]
    fn out_of_range_priority_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_priority = 9\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_scheme_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[server]\nuri_scheme = \"tm://\"\n").expect("write config");

        assert!(matches!(
            Config::load(&path),
            Err(crate::error::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.tasks.default_priority, 3);
    }

    #[test]
    fn load_from_dir_falls_back_on_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "this = [not valid").expect("write config");

        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.server.name, "taskmate-server");
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("default_priority = 3"));
        assert!(written.contains("root = \"output\""));
    }
}
