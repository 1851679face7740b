//! Group snapshots: building them from the feed, diffing them against the
//! last committed state, and storing them between cycles.

use async_trait::async_trait;
use shared_types::{DayKey, GroupId, GroupSnapshot, Interval};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::compact::compact;
use crate::feed::GroupFeed;

/// A day whose merged intervals differ from the committed baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedDay {
    pub day: DayKey,
    pub intervals: Vec<Interval>,
}

/// Rebuild a group's snapshot from scratch out of its raw feed slots.
pub fn build_snapshot(feed: &GroupFeed) -> GroupSnapshot {
    let mut snapshot = GroupSnapshot::new(feed.updated_at);
    for (day, slots) in &feed.days {
        snapshot.per_day.insert(*day, compact(slots));
    }
    snapshot
}

/// Days of `current` whose interval sequence changed, ascending by date.
///
/// Without a previous snapshot every non-empty day is new. A day missing from
/// `previous` compares as empty. Days that only exist in `previous` are not
/// reported: a feed that stops mentioning a day has told us nothing new.
pub fn diff(previous: Option<&GroupSnapshot>, current: &GroupSnapshot) -> Vec<ChangedDay> {
    current
        .per_day
        .iter()
        .filter(|(day, intervals)| match previous {
            None => !intervals.is_empty(),
            Some(previous) => previous.intervals(day) != intervals.as_slice(),
        })
        .map(|(day, intervals)| ChangedDay {
            day: *day,
            intervals: intervals.clone(),
        })
        .collect()
}

/// Days to work on this cycle: the changed days plus any day still owed a
/// notification from an earlier cycle, ascending by date.
///
/// A pending day is picked up with its current intervals only while the feed
/// still reports it; otherwise it stays pending.
pub fn due_days(previous: Option<&GroupSnapshot>, current: &GroupSnapshot) -> Vec<ChangedDay> {
    let mut due = diff(previous, current);
    let Some(previous) = previous else {
        return due;
    };

    for day in &previous.pending_notify {
        if due.iter().any(|c| c.day == *day) {
            continue;
        }
        if let Some(intervals) = current.per_day.get(day) {
            due.push(ChangedDay {
                day: *day,
                intervals: intervals.clone(),
            });
        }
    }
    due.sort_by_key(|c| c.day);
    due
}

/// Starting point for the snapshot committed at the end of a cycle.
///
/// Keeps what was previously committed so failed days stay at their old
/// value, and drops days older than anything the feed still reports.
pub fn baseline(previous: Option<&GroupSnapshot>, current: &GroupSnapshot) -> GroupSnapshot {
    let mut base = previous.cloned().unwrap_or_default();
    if let Some(earliest) = current.earliest_day() {
        base.per_day.retain(|day, _| *day >= earliest);
        base.pending_notify.retain(|day| *day >= earliest);
    }
    base.updated_at = current.updated_at;
    base
}

/// Last committed snapshot per group
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, group: &GroupId) -> anyhow::Result<Option<GroupSnapshot>>;

    async fn put(&self, group: &GroupId, snapshot: GroupSnapshot) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<GroupId, GroupSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(snapshots: HashMap<GroupId, GroupSnapshot>) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    /// Copy of everything stored, e.g. for dumping after a cycle
    pub async fn dump(&self) -> HashMap<GroupId, GroupSnapshot> {
        self.snapshots.read().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get(&self, group: &GroupId) -> anyhow::Result<Option<GroupSnapshot>> {
        Ok(self.snapshots.read().await.get(group).cloned())
    }

    async fn put(&self, group: &GroupId, snapshot: GroupSnapshot) -> anyhow::Result<()> {
        self.snapshots.write().await.insert(group.clone(), snapshot);
        Ok(())
    }
}
