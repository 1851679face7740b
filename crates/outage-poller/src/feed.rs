//! Parsing of the planned-outages feed.
//!
//! The payload is a JSON object keyed by group id. Each group holds day
//! objects under arbitrary keys (`today`, `tomorrow`) plus an `updatedOn`
//! registry timestamp:
//!
//! ```json
//! {
//!   "1.1": {
//!     "today": {
//!       "date": "2025-11-05T00:00:00+02:00",
//!       "status": "ScheduleApplies",
//!       "slots": [{ "start": 960, "end": 1200, "type": "Definite" }]
//!     },
//!     "updatedOn": "2025-11-05T08:26:08+00:00"
//!   }
//! }
//! ```
//!
//! Broken days are skipped and logged; only a payload that is not an object
//! at all is an error.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{DayKey, GroupId, Slot, MINUTES_PER_DAY};
use std::collections::BTreeMap;

use crate::error::FeedError;

const UPDATED_ON_KEY: &str = "updatedOn";

/// Publication state of one day's schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayStatus {
    ScheduleApplies,
    WaitingForSchedule,
    EmergencyShutdowns,
    Other(String),
}

impl DayStatus {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("ScheduleApplies") => DayStatus::ScheduleApplies,
            Some("WaitingForSchedule") => DayStatus::WaitingForSchedule,
            Some("EmergencyShutdowns") => DayStatus::EmergencyShutdowns,
            Some(other) => DayStatus::Other(other.to_string()),
        }
    }

    /// Only a published schedule says anything about planned outages.
    pub fn has_schedule(&self) -> bool {
        matches!(self, DayStatus::ScheduleApplies)
    }
}

#[derive(Debug, Deserialize)]
struct RawDay {
    date: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    slots: Vec<Slot>,
}

/// Raw slots for one group, keyed by the calendar date they apply to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupFeed {
    pub days: BTreeMap<DayKey, Vec<Slot>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPayload {
    groups: BTreeMap<GroupId, GroupFeed>,
}

impl FeedPayload {
    pub fn from_json(text: &str) -> Result<Self, FeedError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, FeedError> {
        let object = value
            .as_object()
            .ok_or_else(|| FeedError::NotAnObject(json_kind(value)))?;

        let mut groups = BTreeMap::new();
        for (group, group_value) in object {
            let Some(group_object) = group_value.as_object() else {
                tracing::warn!("Skipping group {}: expected an object", group);
                continue;
            };
            groups.insert(GroupId::from(group.as_str()), parse_group(group, group_object));
        }

        Ok(Self { groups })
    }

    pub fn group(&self, id: &GroupId) -> Option<&GroupFeed> {
        self.groups.get(id)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.keys()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn parse_group(group: &str, object: &serde_json::Map<String, Value>) -> GroupFeed {
    let updated_at = object
        .get(UPDATED_ON_KEY)
        .and_then(Value::as_str)
        .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!("Group {}: unparsable {} '{}': {}", group, UPDATED_ON_KEY, raw, e);
                None
            }
        });

    let mut feed = GroupFeed {
        days: BTreeMap::new(),
        updated_at,
    };

    for (label, day_value) in object {
        if label == UPDATED_ON_KEY || !day_value.is_object() {
            continue;
        }

        let raw: RawDay = match serde_json::from_value(day_value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Group {}: skipping malformed day '{}': {}", group, label, e);
                continue;
            }
        };

        let Some(day) = parse_day_key(&raw.date) else {
            tracing::warn!("Group {}: skipping day '{}' with bad date '{}'", group, label, raw.date);
            continue;
        };

        let status = DayStatus::parse(raw.status.as_deref());
        if !status.has_schedule() {
            tracing::debug!("Group {}: no schedule for {} ({:?})", group, day, status);
            continue;
        }

        if let Some(slot) = raw.slots.iter().find(|s| s.start > MINUTES_PER_DAY || s.end > MINUTES_PER_DAY) {
            tracing::warn!(
                "Group {}: skipping {} with out-of-range slot {}-{}",
                group,
                day,
                slot.start,
                slot.end
            );
            continue;
        }

        if feed.days.contains_key(&day) {
            tracing::warn!("Group {}: duplicate entry for {} under '{}' ignored", group, day, label);
            continue;
        }

        feed.days.insert(day, raw.slots);
    }

    feed
}

/// Accepts a full RFC 3339 timestamp (the local date is kept) or a bare date.
fn parse_day_key(raw: &str) -> Option<DayKey> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
