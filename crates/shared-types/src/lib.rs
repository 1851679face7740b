use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Minutes in one calendar day; the exclusive upper bound of a slot.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Calendar date a schedule applies to, serialized as `YYYY-MM-DD`
pub type DayKey = NaiveDate;

/// Outage queue identifier as published by the feed (e.g. "1.1", "3.2")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        GroupId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        GroupId::new(id)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        GroupId(id)
    }
}

/// One (group, day) reconciliation unit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub group: GroupId,
    pub day: DayKey,
}

impl UnitKey {
    pub fn new(group: GroupId, day: DayKey) -> Self {
        Self { group, day }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {} on {}", self.group, self.day)
    }
}

/// Outage certainty attached to a raw slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    #[serde(alias = "DEFINITE_OUTAGE")]
    Definite,
    #[serde(alias = "POSSIBLE_OUTAGE")]
    Possible,
    NotPlanned,
    #[serde(other)]
    Unknown,
}

/// Raw minute range from the feed, half-open `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: u16,
    pub end: u16,
    #[serde(rename = "type")]
    pub kind: SlotKind,
}

impl Slot {
    pub fn new(start: u16, end: u16, kind: SlotKind) -> Self {
        Self { start, end, kind }
    }

    pub fn is_definite(&self) -> bool {
        self.kind == SlotKind::Definite
    }

    /// Zero-length and inverted slots carry no outage time.
    pub fn has_duration(&self) -> bool {
        self.end > self.start
    }
}

/// Contiguous definite outage, in minutes since local midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl Interval {
    pub fn new(start_minutes: u16, end_minutes: u16) -> Self {
        Self {
            start_minutes,
            end_minutes,
        }
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_minutes.saturating_sub(self.start_minutes)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_minutes / 60,
            self.start_minutes % 60,
            self.end_minutes / 60,
            self.end_minutes % 60
        )
    }
}

/// Full per-day interval state for one group at one poll.
///
/// Equality compares `per_day` only; `updated_at` is upstream bookkeeping
/// and a bump alone is not a schedule change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub per_day: BTreeMap<DayKey, Vec<Interval>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// Days whose calendar was touched but whose notification was not yet
    /// delivered. Cleared once the notifier accepts it.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub pending_notify: BTreeSet<DayKey>,
}

impl GroupSnapshot {
    pub fn new(updated_at: Option<DateTime<FixedOffset>>) -> Self {
        Self {
            per_day: BTreeMap::new(),
            updated_at,
            pending_notify: BTreeSet::new(),
        }
    }

    pub fn intervals(&self, day: &DayKey) -> &[Interval] {
        self.per_day.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn earliest_day(&self) -> Option<DayKey> {
        self.per_day.keys().next().copied()
    }
}

impl PartialEq for GroupSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.per_day == other.per_day
    }
}

impl Eq for GroupSnapshot {}

/// Calendar entry the engine wants to exist
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesiredEvent {
    pub start_iso: String,
    pub end_iso: String,
    pub summary: String,
    pub description: String,
}

/// Calendar entry as reported by the external calendar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub id: String,
    pub start_iso: String,
    pub end_iso: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

impl ObservedEvent {
    pub fn from_desired(id: impl Into<String>, desired: &DesiredEvent) -> Self {
        Self {
            id: id.into(),
            start_iso: desired.start_iso.clone(),
            end_iso: desired.end_iso.clone(),
            summary: desired.summary.clone(),
            description: desired.description.clone(),
        }
    }

    /// Same slot in the calendar: start, end and summary match exactly.
    /// Description is free-form and never participates.
    pub fn matches(&self, desired: &DesiredEvent) -> bool {
        self.start_iso == desired.start_iso
            && self.end_iso == desired.end_iso
            && self.summary == desired.summary
    }
}

/// Minimal mutation set turning the observed calendar into the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub to_delete: Vec<ObservedEvent>,
    pub to_add: Vec<DesiredEvent>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}
