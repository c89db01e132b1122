//! Task memory store
//!
//! Durable per-task manifests plus the current-task pointer, consumed by the
//! orchestrator and by the hosting CLI for "current task" resolution. Pure
//! persistence: reads return safe defaults instead of raising on missing or
//! corrupt files.
//!
//! Layout under the data directory:
//! - `tasks/<task-id>.json`: one manifest document per task
//! - `current_task`: single pointer file, whole-file overwrite
//!
//! Single-writer: there is no file locking. Two orchestration runs must not
//! share a data directory concurrently.

use crate::error::{Error, Result};
use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use synod_llm::ModelTier;
use tracing::warn;

/// Persisted metadata record for one task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskManifest {
    /// Task title
    #[serde(default)]
    pub title: String,
    /// Full task description
    #[serde(default)]
    pub description: String,
    /// Explicit goals
    #[serde(default)]
    pub goals: Vec<String>,
    /// Constraints
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Chosen model tier
    #[serde(default)]
    pub model_tier: Option<ModelTier>,
    /// Roles that contributed to the last completed run
    #[serde(default)]
    pub agents_involved: Vec<Role>,
    /// Whether the last run's synthesis degraded to concatenation
    #[serde(default)]
    pub degraded: bool,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Durable per-task manifest and current-task pointer persistence
#[derive(Debug, Clone)]
pub struct TaskMemoryStore {
    root: PathBuf,
}

impl TaskMemoryStore {
    /// Create a store rooted at the given data directory
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    fn manifest_path(&self, task_id: &str) -> PathBuf {
        self.tasks_dir().join(format!("{task_id}.json"))
    }

    fn pointer_path(&self) -> PathBuf {
        self.root.join("current_task")
    }

    /// Write a task manifest
    pub fn write_manifest(&self, task_id: &str, manifest: &TaskManifest) -> Result<()> {
        std::fs::create_dir_all(self.tasks_dir())
            .map_err(|e| Error::Store(format!("creating {:?}: {e}", self.tasks_dir())))?;

        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| Error::Store(format!("serializing manifest: {e}")))?;

        let path = self.manifest_path(task_id);
        std::fs::write(&path, json).map_err(|e| Error::Store(format!("writing {path:?}: {e}")))
    }

    /// Read a task manifest, defaulting on missing or corrupt files
    #[must_use]
    pub fn read_manifest(&self, task_id: &str) -> TaskManifest {
        let path = self.manifest_path(task_id);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return TaskManifest::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "unreadable manifest, returning default");
            TaskManifest::default()
        })
    }

    /// Set the current-task pointer
    pub fn set_current_task(&self, task_id: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| Error::Store(format!("creating {:?}: {e}", self.root)))?;
        std::fs::write(self.pointer_path(), task_id)
            .map_err(|e| Error::Store(format!("writing current-task pointer: {e}")))
    }

    /// Read the current-task pointer
    #[must_use]
    pub fn current_task(&self) -> Option<String> {
        let content = std::fs::read_to_string(self.pointer_path()).ok()?;
        let id = content.trim().to_string();
        (!id.is_empty()).then_some(id)
    }

    /// Clear the current-task pointer
    pub fn clear_current_task(&self) -> Result<()> {
        let path = self.pointer_path();
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::Store(format!("removing {path:?}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> TaskManifest {
        TaskManifest {
            title: "Harden the API".to_string(),
            description: "Audit and fix input handling".to_string(),
            goals: vec!["no breaking changes".to_string()],
            constraints: vec!["ship this week".to_string()],
            model_tier: Some(ModelTier::Premium),
            agents_involved: vec![Role::SecurityExpert, Role::CodeAnalyzer],
            degraded: false,
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = TaskMemoryStore::new(dir.path());
        let m = manifest();

        store.write_manifest("task-1", &m).unwrap();
        assert_eq!(store.read_manifest("task-1"), m);
    }

    #[test]
    fn test_read_missing_manifest_defaults() {
        let dir = TempDir::new().unwrap();
        let store = TaskMemoryStore::new(dir.path());
        assert_eq!(store.read_manifest("nope"), TaskManifest::default());
    }

    #[test]
    fn test_read_corrupt_manifest_defaults() {
        let dir = TempDir::new().unwrap();
        let store = TaskMemoryStore::new(dir.path());
        store.write_manifest("task-1", &manifest()).unwrap();
        std::fs::write(store.manifest_path("task-1"), "}{").unwrap();

        assert_eq!(store.read_manifest("task-1"), TaskManifest::default());
    }

    #[test]
    fn test_current_task_pointer_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = TaskMemoryStore::new(dir.path());

        assert!(store.current_task().is_none());

        store.set_current_task("task-42").unwrap();
        assert_eq!(store.current_task().as_deref(), Some("task-42"));

        // Whole-file overwrite
        store.set_current_task("task-43").unwrap();
        assert_eq!(store.current_task().as_deref(), Some("task-43"));

        store.clear_current_task().unwrap();
        assert!(store.current_task().is_none());

        // Clearing twice is fine
        store.clear_current_task().unwrap();
    }

    #[test]
    fn test_empty_pointer_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = TaskMemoryStore::new(dir.path());
        store.set_current_task("  ").unwrap();
        assert!(store.current_task().is_none());
    }
}
