//! Reminder actor: the recurring scan that turns due tasks into
//! notifications.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::{DEFAULT_LEAD_TIME_SECS, DEFAULT_TICK_INTERVAL_SECS};
use crate::domain::{Notification, Task};
use crate::store::TaskStore;
use crate::transport::Publisher;
use crate::{dlog, dlog_debug, dlog_trace, dlog_warn};

use super::ActorHandle;

const TICK_INTERVAL: Duration = Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS);
const LEAD_TIME: Duration = Duration::from_secs(DEFAULT_LEAD_TIME_SECS);

/// Actor that periodically scans the store and publishes reminders.
///
/// Delivery is attempted once per task: a task is flagged as reminded by the
/// scan itself, so a failed publish is logged and never retried.
pub struct ReminderScheduler {
    store: Arc<TaskStore>,
    publisher: Arc<dyn Publisher>,
    interval: Duration,
    lead_time: chrono::Duration,
}

impl ReminderScheduler {
    pub fn new(store: Arc<TaskStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            interval: TICK_INTERVAL,
            lead_time: to_chrono(LEAD_TIME),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_lead_time(mut self, lead_time: Duration) -> Self {
        self.lead_time = to_chrono(lead_time);
        self
    }

    /// Run one scan at `now` and publish a reminder for every due task.
    ///
    /// Returns the notifications that were handed to the publisher, whether
    /// or not any subscriber received them.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let due = self.store.scan_due(now, self.lead_time).await;
        dlog_trace!("ReminderScheduler tick at {}: {} due", now, due.len());

        due.iter()
            .map(|task| {
                let notification = Notification::reminder(task);
                match self.publisher.publish(&notification) {
                    Ok(reached) => {
                        dlog_debug!("Reminder for {} reached {} subscriber(s)", task.id.short(), reached)
                    }
                    Err(e) => dlog_warn!("Reminder for '{}' not delivered: {}", task.title, e),
                }
                dlog!("{}", reminder_line(task, self.lead_time));
                notification
            })
            .collect()
    }

    pub fn spawn(self) -> ActorHandle {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        dlog_debug!(
            "ReminderScheduler::spawn interval={:?} lead={}",
            self.interval,
            humanize_minutes(self.lead_time.num_minutes())
        );

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        dlog_debug!("ReminderScheduler cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        self.tick(Utc::now()).await;
                    }
                }
            }
        });

        ActorHandle::new(cancel, task)
    }
}

fn reminder_line(task: &Task, lead_time: chrono::Duration) -> String {
    format!(
        "[Reminder] '{}' is due in {}.",
        task.title,
        humanize_minutes(lead_time.num_minutes())
    )
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Render a minute count as `2 hours 5 minutes`, `1 hour`, `45 minutes`.
pub fn humanize_minutes(total: i64) -> String {
    if total < 1 {
        return "less than a minute".to_string();
    }
    let (hours, minutes) = (total / 60, total % 60);
    match (hours, minutes) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}
