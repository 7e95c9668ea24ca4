//! Actor system for background tasks.
//!
//! Each actor is an independent tokio task driven by its own interval.
//! The only actor today is the `ReminderScheduler`, which scans the task
//! store and publishes reminders.

pub mod reminder;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use reminder::ReminderScheduler;

/// Handle to a running actor, used for graceful shutdown.
pub struct ActorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActorHandle {
    pub fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    /// Signal the actor to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Request shutdown and wait for the actor's loop to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
