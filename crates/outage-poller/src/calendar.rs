use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use shared_types::{DesiredEvent, ObservedEvent};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::ports::{CalendarPort, DayWindow};

/// Calendar kept in process memory.
///
/// Used by the dry-run binary and by tests; behaves like a real calendar
/// in that ids are assigned on insert and unknown ids fail on delete.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    calendars: Mutex<HashMap<String, Vec<ObservedEvent>>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(calendars: HashMap<String, Vec<ObservedEvent>>) -> Self {
        Self {
            calendars: Mutex::new(calendars),
        }
    }

    /// All events in a calendar, in insertion order
    pub async fn events(&self, calendar_id: &str) -> Vec<ObservedEvent> {
        self.calendars
            .lock()
            .await
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CalendarPort for MemoryCalendar {
    async fn list_events(&self, calendar_id: &str, window: &DayWindow) -> Result<Vec<ObservedEvent>> {
        let calendars = self.calendars.lock().await;
        let Some(events) = calendars.get(calendar_id) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for event in events {
            match DateTime::parse_from_rfc3339(&event.start_iso) {
                Ok(start) if window.contains(&start) => found.push(event.clone()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Ignoring event {} in {} with unparsable start '{}': {}",
                        event.id,
                        calendar_id,
                        event.start_iso,
                        e
                    );
                }
            }
        }
        Ok(found)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let mut calendars = self.calendars.lock().await;
        let events = calendars
            .get_mut(calendar_id)
            .ok_or_else(|| anyhow::anyhow!("Calendar '{}' not found", calendar_id))?;

        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            anyhow::bail!("Event {} not found in calendar '{}'", event_id, calendar_id);
        }

        tracing::debug!("Deleted event {} from {}", event_id, calendar_id);
        Ok(())
    }

    async fn insert_event(&self, calendar_id: &str, event: &DesiredEvent) -> Result<ObservedEvent> {
        let created = ObservedEvent::from_desired(Uuid::new_v4().to_string(), event);
        self.calendars
            .lock()
            .await
            .entry(calendar_id.to_string())
            .or_default()
            .push(created.clone());

        tracing::debug!(
            "Created event {} in {} ({} - {})",
            created.id,
            calendar_id,
            created.start_iso,
            created.end_iso
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn event(start: &str, end: &str) -> DesiredEvent {
        DesiredEvent {
            start_iso: start.to_string(),
            end_iso: end.to_string(),
            summary: "Power outage".to_string(),
            description: String::new(),
        }
    }

    fn window() -> DayWindow {
        DayWindow {
            day: NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
            start: DateTime::parse_from_rfc3339("2025-11-05T00:00:00+02:00").unwrap(),
            end: DateTime::parse_from_rfc3339("2025-11-06T00:00:00+02:00").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_list_within_window() {
        let calendar = MemoryCalendar::new();
        let inside = assert_ok!(
            calendar
                .insert_event("cal", &event("2025-11-05T10:00:00+02:00", "2025-11-05T12:00:00+02:00"))
                .await
        );
        assert_ok!(
            calendar
                .insert_event("cal", &event("2025-11-06T00:00:00+02:00", "2025-11-06T02:00:00+02:00"))
                .await
        );

        let listed = assert_ok!(calendar.list_events("cal", &window()).await);
        assert_eq!(listed, vec![inside]);
        assert!(assert_ok!(calendar.list_events("other", &window()).await).is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_event_fails() {
        let calendar = MemoryCalendar::new();
        assert_err!(calendar.delete_event("cal", "missing").await);

        let created = assert_ok!(
            calendar
                .insert_event("cal", &event("2025-11-05T10:00:00+02:00", "2025-11-05T12:00:00+02:00"))
                .await
        );
        assert_err!(calendar.delete_event("cal", "missing").await);
        assert_ok!(calendar.delete_event("cal", &created.id).await);
        assert!(calendar.events("cal").await.is_empty());
    }
}
