//! Query telemetry events and the sink collaborator.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// One record per executed statement (or atomic batch). Created by the
/// session and handed to the sink immediately; the session keeps nothing.
#[derive(Debug, Clone)]
pub struct QueryEvent {
    pub statement: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Rows returned or affected. `None` for batches and failures.
    pub rows_affected: Option<u64>,
    pub failure: Option<String>,
}

impl QueryEvent {
    pub(crate) fn success(
        statement: String,
        started_at: DateTime<Utc>,
        duration: Duration,
        rows_affected: Option<u64>,
    ) -> Self {
        Self {
            statement,
            started_at,
            duration,
            rows_affected,
            failure: None,
        }
    }

    pub(crate) fn failed(
        statement: String,
        started_at: DateTime<Utc>,
        duration: Duration,
        failure: String,
    ) -> Self {
        Self {
            statement,
            started_at,
            duration,
            rows_affected: None,
            failure: Some(failure),
        }
    }
}

/// External collaborator the session reports to.
pub trait QuerySink: Send + Sync {
    /// Take ownership of one event. Called once per executed statement.
    fn record(&self, event: QueryEvent);
}

/// Default sink: structured logs via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl QuerySink for TracingSink {
    fn record(&self, event: QueryEvent) {
        if let Some(failure) = &event.failure {
            tracing::warn!(
                target: "rowkit::query",
                statement = %event.statement,
                duration = ?event.duration,
                %failure,
                "query failed"
            );
        } else {
            tracing::debug!(
                target: "rowkit::query",
                statement = %event.statement,
                duration = ?event.duration,
                rows = event.rows_affected,
                "query ok"
            );
        }
    }
}
