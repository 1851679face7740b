//! Projection of merged intervals onto calendar events.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use shared_types::{DayKey, DesiredEvent, GroupId, Interval, UnitKey};

use crate::error::{SyncError, SyncResult};
use crate::ports::DayWindow;

#[derive(Debug, Clone)]
pub struct EventSettings {
    pub timezone: Tz,
    pub summary_template: String,
}

impl EventSettings {
    pub fn summary(&self, group: &GroupId) -> String {
        self.summary_template.replace("{group}", group.as_str())
    }
}

/// Local instant `minutes` after midnight of `day`.
///
/// Ambiguous times resolve to the earlier instant; times inside a DST gap
/// are pushed one hour forward.
fn local_instant(tz: &Tz, day: DayKey, minutes: u16) -> Option<DateTime<FixedOffset>> {
    let naive = day.and_hms_opt(0, 0, 0)? + Duration::minutes(i64::from(minutes));
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|instant| instant.fixed_offset())
}

fn iso(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn day_window(key: &UnitKey, tz: &Tz) -> SyncResult<DayWindow> {
    let start = local_instant(tz, key.day, 0).ok_or_else(|| SyncError::LocalTime {
        key: key.clone(),
        minutes: 0,
    })?;
    let end = local_instant(tz, key.day, shared_types::MINUTES_PER_DAY).ok_or_else(|| {
        SyncError::LocalTime {
            key: key.clone(),
            minutes: shared_types::MINUTES_PER_DAY,
        }
    })?;
    Ok(DayWindow {
        day: key.day,
        start,
        end,
    })
}

/// One desired event per interval, in interval order.
///
/// An interval lying wholly inside a DST gap projects to an empty range
/// once its start is pushed forward; it is skipped rather than emitted as a
/// zero-length event.
pub fn build_desired_events(
    key: &UnitKey,
    intervals: &[Interval],
    registry_updated_at: Option<&DateTime<FixedOffset>>,
    settings: &EventSettings,
) -> SyncResult<Vec<DesiredEvent>> {
    let summary = settings.summary(&key.group);
    let description = match registry_updated_at {
        Some(updated) => format!(
            "Schedule updated {}",
            updated.with_timezone(&settings.timezone).format("%Y-%m-%d %H:%M")
        ),
        None => "Planned outage".to_string(),
    };

    let at = |minutes: u16| {
        local_instant(&settings.timezone, key.day, minutes).ok_or_else(|| SyncError::LocalTime {
            key: key.clone(),
            minutes,
        })
    };

    let mut events = Vec::with_capacity(intervals.len());
    for interval in intervals {
        let start = at(interval.start_minutes)?;
        let end = at(interval.end_minutes)?;
        if start >= end {
            tracing::debug!("Skipping {} for {}: no local time left after DST shift", interval, key);
            continue;
        }
        events.push(DesiredEvent {
            start_iso: iso(&start),
            end_iso: iso(&end),
            summary: summary.clone(),
            description: description.clone(),
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> EventSettings {
        EventSettings {
            timezone: chrono_tz::Europe::Kyiv,
            summary_template: "Outage {group}".to_string(),
        }
    }

    fn key(day: &str) -> UnitKey {
        UnitKey::new(
            GroupId::from("1.1"),
            NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
        )
    }

    #[test]
    fn test_events_use_local_offset() {
        let events = build_desired_events(
            &key("2025-11-05"),
            &[Interval::new(600, 660), Interval::new(1380, 1440)],
            None,
            &settings(),
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start_iso, "2025-11-05T10:00:00+02:00");
        assert_eq!(events[0].end_iso, "2025-11-05T11:00:00+02:00");
        assert_eq!(events[1].start_iso, "2025-11-05T23:00:00+02:00");
        assert_eq!(events[1].end_iso, "2025-11-06T00:00:00+02:00");
        assert_eq!(events[0].summary, "Outage 1.1");
        assert_eq!(events[0].description, "Planned outage");
    }

    #[test]
    fn test_summer_offset() {
        let events =
            build_desired_events(&key("2025-07-01"), &[Interval::new(0, 240)], None, &settings())
                .unwrap();
        assert_eq!(events[0].start_iso, "2025-07-01T00:00:00+03:00");
        assert_eq!(events[0].end_iso, "2025-07-01T04:00:00+03:00");
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // Kyiv skips 03:00-04:00 on the last Sunday of March.
        let events = build_desired_events(
            &key("2025-03-30"),
            &[Interval::new(180, 300)],
            None,
            &settings(),
        )
        .unwrap();
        assert_eq!(events[0].start_iso, "2025-03-30T04:00:00+03:00");
        assert_eq!(events[0].end_iso, "2025-03-30T05:00:00+03:00");
    }

    #[test]
    fn test_interval_inside_dst_gap_skipped() {
        let events = build_desired_events(
            &key("2025-03-30"),
            &[Interval::new(180, 240), Interval::new(600, 660)],
            None,
            &settings(),
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_iso, "2025-03-30T10:00:00+03:00");
    }

    #[test]
    fn test_description_carries_registry_time() {
        let updated = DateTime::parse_from_rfc3339("2025-11-05T08:26:08+00:00").unwrap();
        let events = build_desired_events(
            &key("2025-11-05"),
            &[Interval::new(0, 60)],
            Some(&updated),
            &settings(),
        )
        .unwrap();
        assert_eq!(events[0].description, "Schedule updated 2025-11-05 10:26");
    }

    #[test]
    fn test_day_window_spans_local_day() {
        let window = day_window(&key("2025-11-05"), &chrono_tz::Europe::Kyiv).unwrap();
        assert_eq!(iso(&window.start), "2025-11-05T00:00:00+02:00");
        assert_eq!(iso(&window.end), "2025-11-06T00:00:00+02:00");
        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
    }
}
