//! Error types for the reconciliation engine.
//!
//! Feed errors abort a cycle before anything is reconciled. Sync errors are
//! scoped to one group or one (group, day) unit and never stop the others.

use shared_types::{GroupId, UnitKey};
use thiserror::Error;

/// The payload as a whole could not be used
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed payload must be a JSON object keyed by group, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Another cycle holds the guard; this invocation was dropped
    #[error("A reconciliation cycle is already running")]
    CycleInProgress,

    #[error("Failed to list calendar events for {key}: {source:#}")]
    CalendarList {
        key: UnitKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to delete calendar event {event_id} for {key}: {source:#}")]
    CalendarDelete {
        key: UnitKey,
        event_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to add calendar event for {key}: {source:#}")]
    CalendarInsert {
        key: UnitKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to send notification for {key}: {source:#}")]
    Notify {
        key: UnitKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Snapshot store failed for group {group}: {source:#}")]
    Store {
        group: GroupId,
        #[source]
        source: anyhow::Error,
    },

    /// Local wall-clock time does not exist in the configured timezone
    #[error("Cannot place minute {minutes} of {key} in local time")]
    LocalTime { key: UnitKey, minutes: u16 },
}

impl SyncError {
    /// The unit this error is scoped to, if it is narrower than a group
    pub fn unit(&self) -> Option<&UnitKey> {
        match self {
            SyncError::CalendarList { key, .. }
            | SyncError::CalendarDelete { key, .. }
            | SyncError::CalendarInsert { key, .. }
            | SyncError::Notify { key, .. }
            | SyncError::LocalTime { key, .. } => Some(key),
            SyncError::CycleInProgress | SyncError::Store { .. } => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
