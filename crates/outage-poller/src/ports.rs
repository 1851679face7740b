//! Interfaces to the systems the engine drives.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use shared_types::{DayKey, DesiredEvent, GroupId, ObservedEvent};

/// Local-midnight-to-local-midnight span of one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub day: DayKey,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DayWindow {
    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// External calendar holding one calendar per group
#[async_trait]
pub trait CalendarPort: Send + Sync {
    /// Events starting inside `window`
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &DayWindow,
    ) -> anyhow::Result<Vec<ObservedEvent>>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> anyhow::Result<()>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &DesiredEvent,
    ) -> anyhow::Result<ObservedEvent>;
}

/// Data for a "schedule changed" message; rendering is the sender's job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub group: GroupId,
    pub day: DayKey,
    /// Full outage list for the day after the change
    pub events: Vec<DesiredEvent>,
    pub registry_updated_at: Option<DateTime<FixedOffset>>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
