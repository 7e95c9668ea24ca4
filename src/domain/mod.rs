//! Domain core: the task model, due-date parsing, and candidate validation.

pub mod task;
pub mod timestamp;
pub mod validate;

pub use task::{Notification, NotificationTask, RejectedCandidate, ReminderState, Task, TaskId};
pub use timestamp::{format_timestamp, parse_timestamp};
pub use validate::validate;
