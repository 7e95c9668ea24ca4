//! Batch ingestion: validate candidates, store the accepted ones, and
//! summarize the outcome for the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{validate, RejectedCandidate};
use crate::store::TaskStore;
use crate::{dlog, dlog_debug, dlog_warn, Error};

/// Reply to one ingest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestResponse {
    /// Every candidate was accepted.
    Success {
        added: usize,
        rejected: Vec<RejectedCandidate>,
        total: usize,
    },
    /// At least one candidate was rejected. Accepted ones are still stored.
    PartialSuccess {
        added: usize,
        rejected: Vec<RejectedCandidate>,
        total: usize,
    },
    /// The request itself was malformed; nothing was stored.
    Error { message: String },
}

impl IngestResponse {
    pub fn status(&self) -> &'static str {
        match self {
            IngestResponse::Success { .. } => "success",
            IngestResponse::PartialSuccess { .. } => "partial_success",
            IngestResponse::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, IngestResponse::Error { .. })
    }
}

impl From<Error> for IngestResponse {
    fn from(err: Error) -> Self {
        IngestResponse::Error {
            message: err.to_string(),
        }
    }
}

/// Turns ingest requests into store mutations.
pub struct IngestHandler {
    store: Arc<TaskStore>,
}

impl IngestHandler {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Handle one request as received on the wire.
    pub async fn handle_raw(&self, raw: &str) -> IngestResponse {
        match serde_json::from_str::<Value>(raw) {
            Ok(batch) => self.handle(&batch).await,
            Err(e) => {
                dlog_warn!("Rejecting unparsable request: {}", e);
                Error::RequestShape(format!("Invalid JSON request: {}", e)).into()
            }
        }
    }

    pub async fn handle(&self, batch: &Value) -> IngestResponse {
        self.handle_at(batch, Utc::now()).await
    }

    /// Handle a batch, validating every candidate against `now`.
    pub async fn handle_at(&self, batch: &Value, now: DateTime<Utc>) -> IngestResponse {
        let Some(candidates) = batch.as_array() else {
            dlog_warn!("Rejecting request: top-level value is not a list");
            return Error::RequestShape("Expected a list of tasks".to_string()).into();
        };

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for candidate in candidates {
            match validate(candidate, now) {
                Ok(task) => accepted.push(task),
                Err(rejection) => {
                    dlog_debug!("Candidate rejected: {:?}", rejection.errors);
                    rejected.push(rejection);
                }
            }
        }

        let added = accepted.len();
        let total = self.store.append_accepted(accepted).await;
        dlog!(
            "Ingest: {} added, {} rejected, {} total",
            added,
            rejected.len(),
            total
        );

        if rejected.is_empty() {
            IngestResponse::Success {
                added,
                rejected,
                total,
            }
        } else {
            IngestResponse::PartialSuccess {
                added,
                rejected,
                total,
            }
        }
    }
}
