//! Candidate validation.
//!
//! Every rule runs; errors accumulate in rule order. A candidate either
//! becomes a complete `Task` or a `RejectedCandidate`, never something in
//! between.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::task::{RejectedCandidate, Task};
use super::timestamp::{format_timestamp, parse_timestamp};

pub const ERR_TITLE: &str = "Missing or invalid task title";
pub const ERR_DUE_NOT_STRING: &str = "Due date must be a string in ISO 8601 format";
pub const ERR_DUE_FORMAT: &str = "Invalid due date format. Date must be in ISO 8601 format.";
pub const ERR_DUE_PAST: &str = "Due date must be in the future.";

/// Validate one raw candidate against a single `now` reference.
pub fn validate(candidate: &Value, now: DateTime<Utc>) -> Result<Task, RejectedCandidate> {
    // Non-objects have no fields; every field check then fails.
    let title = candidate.get("title");
    let due = candidate.get("due");

    let mut errors = Vec::new();

    let valid_title = match title {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        _ => {
            errors.push(ERR_TITLE.to_string());
            None
        }
    };

    let valid_due = match due {
        Some(Value::String(raw)) => match parse_timestamp(raw) {
            Ok(at) if at > now => Some(at),
            Ok(_) => {
                errors.push(ERR_DUE_PAST.to_string());
                None
            }
            Err(_) => {
                errors.push(ERR_DUE_FORMAT.to_string());
                None
            }
        },
        _ => {
            errors.push(ERR_DUE_NOT_STRING.to_string());
            None
        }
    };

    match (valid_title, valid_due) {
        (Some(title), Some(at)) if errors.is_empty() => Ok(Task::new(title, format_timestamp(at))),
        _ => Err(RejectedCandidate {
            title: title.cloned().unwrap_or(Value::Null),
            due: due.cloned().unwrap_or(Value::Null),
            errors,
        }),
    }
}
