//! Task data model for the reminder service.
//!
//! A `Task` is created by validation, owned by the `TaskStore`, and
//! walks through `Pending -> Due -> Notified` as time passes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timestamp::parse_timestamp;
use crate::Result;

/// Unique identifier for a task.
///
/// New ids are UUID v4 strings. Ids loaded from disk are kept verbatim,
/// whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Return the first 8 characters for display.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a task sits in its reminder lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    /// Reminder not sent and the window has not opened yet.
    Pending,
    /// Reminder not sent and `now` is inside `[due - lead, due)`.
    Due,
    /// Reminder not sent and the task is already due; it will never fire.
    Missed,
    /// Reminder already sent. Terminal.
    Notified,
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Canonical RFC 3339 text. Parsed on demand so one bad stored value
    /// cannot break loading of the whole file.
    pub due: String,
    #[serde(default, alias = "reminderSent")]
    pub reminder_sent: bool,
}

impl Task {
    /// Build a freshly accepted task with a new id.
    pub fn new(title: &str, due: String) -> Self {
        Self {
            id: TaskId::new(),
            title: title.to_string(),
            due,
            reminder_sent: false,
        }
    }

    /// Parse the stored due date.
    pub fn due_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.due)
    }

    /// Classify the task against `now` and a reminder lead time.
    pub fn reminder_state(&self, now: DateTime<Utc>, lead: Duration) -> Result<ReminderState> {
        if self.reminder_sent {
            return Ok(ReminderState::Notified);
        }
        let due = self.due_at()?;
        if now >= due {
            return Ok(ReminderState::Missed);
        }
        // An overflowing window start means the window reaches back forever.
        match due.checked_sub_signed(lead) {
            Some(opens) if now < opens => Ok(ReminderState::Pending),
            _ => Ok(ReminderState::Due),
        }
    }

    /// Flip the delivery flag. There is no way back.
    pub(crate) fn mark_reminded(&mut self) {
        self.reminder_sent = true;
    }
}

/// A candidate that failed validation, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    /// The title exactly as supplied (`null` when absent).
    pub title: serde_json::Value,
    /// The due value exactly as supplied (`null` when absent).
    pub due: serde_json::Value,
    pub errors: Vec<String>,
}

/// The task fields carried by a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTask {
    pub id: TaskId,
    pub title: String,
    pub due: String,
}

/// Messages broadcast on the publish channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Reminder { task: NotificationTask },
}

impl Notification {
    pub fn reminder(task: &Task) -> Self {
        Self::Reminder {
            task: NotificationTask {
                id: task.id.clone(),
                title: task.title.clone(),
                due: task.due.clone(),
            },
        }
    }
}
