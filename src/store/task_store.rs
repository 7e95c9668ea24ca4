//! The shared task collection.
//!
//! `TaskStore` is the only owner of task state. Both mutating operations
//! run entirely under one lock, persistence included, so the ingest path
//! and the reminder scan never observe each other half-done.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::storage::TaskStorage;
use crate::domain::{ReminderState, Task, TaskId};
use crate::util::blocking;
use crate::{dlog, dlog_debug, dlog_warn};

pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
    storage: Arc<dyn TaskStorage>,
}

impl TaskStore {
    /// Seed the store from `storage`.
    ///
    /// A missing or unreadable store yields an empty collection; the error is
    /// logged, not returned.
    pub async fn open(storage: Arc<dyn TaskStorage>) -> Self {
        let loader = Arc::clone(&storage);
        let tasks = match blocking(move || loader.load()).await {
            Ok(tasks) => tasks,
            Err(e) => {
                dlog_warn!("Could not load stored tasks, starting empty: {}", e);
                Vec::new()
            }
        };

        let unique: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
        if unique.len() != tasks.len() {
            dlog_warn!(
                "Stored tasks contain {} duplicate id(s)",
                tasks.len() - unique.len()
            );
        }

        let pending = tasks.iter().filter(|t| !t.reminder_sent).count();
        dlog!(
            "TaskStore opened: {} tasks ({} awaiting reminder)",
            tasks.len(),
            pending
        );

        Self {
            tasks: Mutex::new(tasks),
            storage,
        }
    }

    /// Add accepted tasks, persist the full collection, and return the new
    /// total. An empty batch still persists.
    pub async fn append_accepted(&self, accepted: Vec<Task>) -> usize {
        let mut tasks = self.tasks.lock().await;

        let mut ids: HashSet<TaskId> = tasks.iter().map(|t| t.id.clone()).collect();
        for mut task in accepted {
            while !ids.insert(task.id.clone()) {
                dlog_warn!("Task id collision on {}, regenerating", task.id);
                task.id = TaskId::new();
            }
            dlog_debug!("Accepted task {} '{}' due {}", task.id.short(), task.title, task.due);
            tasks.push(task);
        }

        self.persist(&tasks).await;
        tasks.len()
    }

    /// Return every task whose reminder window contains `now`, marking each
    /// as reminded and persisting before the lock is released.
    ///
    /// The window is `[due - lead, due)`. A task is returned at most once for
    /// the life of the store. Tasks with an unreadable due date are logged and
    /// skipped.
    pub async fn scan_due(&self, now: DateTime<Utc>, lead: Duration) -> Vec<Task> {
        let mut tasks = self.tasks.lock().await;

        let mut due = Vec::new();
        for task in tasks.iter_mut() {
            match task.reminder_state(now, lead) {
                Ok(ReminderState::Due) => {
                    task.mark_reminded();
                    due.push(task.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    dlog_warn!("Reminder error for task '{}': {}", task.title, e);
                }
            }
        }

        if !due.is_empty() {
            self.persist(&tasks).await;
        }
        due
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Clone of the current collection.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    // Callers hold the collection lock for the duration of the write.
    async fn persist(&self, tasks: &[Task]) {
        let storage = Arc::clone(&self.storage);
        let snapshot = tasks.to_vec();
        if let Err(e) = blocking(move || storage.save(&snapshot)).await {
            dlog_warn!("Failed to persist {} tasks: {}", tasks.len(), e);
        }
    }
}
