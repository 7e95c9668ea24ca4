//! Durable storage backends for the task collection.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::domain::Task;
use crate::{dlog_debug, dlog_warn, Result};

/// Load/save contract for the full task collection.
///
/// Implementations are called from blocking threads and always receive or
/// return the complete collection.
pub trait TaskStorage: Send + Sync + 'static {
    /// Read the last saved collection. A missing store is an empty collection.
    fn load(&self) -> Result<Vec<Task>>;

    /// Replace the stored collection with `tasks`.
    fn save(&self, tasks: &[Task]) -> Result<()>;
}

/// Pretty-printed JSON array on disk, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Decode stored records one at a time so a single malformed entry does not
/// cost the rest of the collection.
fn decode_records(records: Vec<Value>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(|record| {
            let title = record
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("<untitled>")
                .to_string();
            match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    dlog_warn!("Skipping stored task '{}': {}", title, e);
                    None
                }
            }
        })
        .collect()
}

impl TaskStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Task>> {
        dlog_debug!("JsonFileStorage::load path={}", self.path.display());

        if !self.path.exists() {
            dlog_debug!("Task file not found, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let records: Vec<Value> = serde_json::from_str(&contents)?;
        let tasks = decode_records(records);
        dlog_debug!("Task file loaded: {} tasks", tasks.len());
        Ok(tasks)
    }

    fn save(&self, tasks: &[Task]) -> Result<()> {
        let contents = serde_json::to_string_pretty(tasks)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                dlog_debug!("Creating task directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a crash never leaves a half-written file.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)?;
        fs::rename(&temp_path, &self.path)?;
        dlog_debug!("Task file saved: {} ({} tasks)", self.path.display(), tasks.len());
        Ok(())
    }
}
