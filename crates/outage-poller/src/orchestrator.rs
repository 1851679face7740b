//! One reconciliation cycle across all configured groups.
//!
//! For every group the feed is compacted into a snapshot and diffed against
//! the committed one. Each changed day is then reconciled against the
//! group's calendar: stale events are deleted, missing ones inserted, and a
//! notification is sent. A day is committed to the snapshot store only once
//! all of that succeeded, so a failed day is retried from the same baseline
//! on the next cycle.
//!
//! Before the calendar is touched the day is recorded as owing a
//! notification. The mark is cleared only after the notifier accepts it, so
//! a notification that fails after the calendar was already brought in line
//! is still delivered on a later cycle.

use chrono::{DateTime, FixedOffset};
use futures::future::join_all;
use shared_types::{DayKey, DesiredEvent, GroupId, GroupSnapshot, ObservedEvent, UnitKey};
use tokio::sync::Mutex;

use crate::config::GroupConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{self, EventSettings};
use crate::feed::{FeedPayload, GroupFeed};
use crate::ports::{CalendarPort, Notification, Notifier};
use crate::reconcile::reconcile;
use crate::snapshot::{self, ChangedDay, SnapshotStore};

/// Calendar mutations applied for one changed day
#[derive(Debug, Clone)]
pub struct DayChange {
    pub day: DayKey,
    pub deleted: Vec<ObservedEvent>,
    pub added: Vec<DesiredEvent>,
    pub notification: Notification,
}

#[derive(Debug)]
pub struct GroupReconciliationOutcome {
    pub group: GroupId,
    pub changes: Vec<DayChange>,
    /// Days (or the whole group) left at their previous state
    pub failures: Vec<SyncError>,
}

impl GroupReconciliationOutcome {
    fn new(group: GroupId) -> Self {
        Self {
            group,
            changes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.failures.is_empty()
    }
}

pub struct Orchestrator<C, N, S> {
    settings: EventSettings,
    calendar: C,
    notifier: N,
    store: S,
    cycle: Mutex<()>,
}

impl<C, N, S> Orchestrator<C, N, S>
where
    C: CalendarPort,
    N: Notifier,
    S: SnapshotStore,
{
    pub fn new(settings: EventSettings, calendar: C, notifier: N, store: S) -> Self {
        Self {
            settings,
            calendar,
            notifier,
            store,
            cycle: Mutex::new(()),
        }
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconcile every group in `groups` against `payload`.
    ///
    /// Only one cycle runs at a time; an overlapping call is dropped with
    /// `SyncError::CycleInProgress`. Per-unit failures are returned inside
    /// the outcomes. Groups with nothing to report are omitted.
    pub async fn run(
        &self,
        groups: &[GroupConfig],
        payload: &FeedPayload,
    ) -> SyncResult<Vec<GroupReconciliationOutcome>> {
        let _cycle = self
            .cycle
            .try_lock()
            .map_err(|_| SyncError::CycleInProgress)?;

        tracing::debug!("Reconciling {} group(s)", groups.len());

        let pending = groups.iter().filter_map(|target| match payload.group(&target.id) {
            Some(feed) => Some(self.reconcile_group(target, feed)),
            None => {
                tracing::warn!("Group {} is not present in the feed, skipping", target.id);
                None
            }
        });

        let outcomes = join_all(pending).await;

        Ok(outcomes.into_iter().filter(|o| !o.is_empty()).collect())
    }

    async fn reconcile_group(&self, target: &GroupConfig, feed: &GroupFeed) -> GroupReconciliationOutcome {
        let group = &target.id;
        let mut outcome = GroupReconciliationOutcome::new(group.clone());

        let previous = match self.store.get(group).await {
            Ok(previous) => previous,
            Err(source) => {
                tracing::error!("Failed to load snapshot for group {}: {:#}", group, source);
                outcome.failures.push(SyncError::Store {
                    group: group.clone(),
                    source,
                });
                return outcome;
            }
        };

        let current = snapshot::build_snapshot(feed);
        let changed = snapshot::due_days(previous.as_ref(), &current);

        if let Some(previous) = &previous {
            if changed.is_empty() && previous.updated_at != current.updated_at {
                tracing::info!(
                    "Group {}: registry updated at {:?}, schedule unchanged",
                    group,
                    current.updated_at
                );
            }
        }

        let mut committed = snapshot::baseline(previous.as_ref(), &current);
        for (day, intervals) in &current.per_day {
            if !changed.iter().any(|c| c.day == *day) {
                committed.per_day.insert(*day, intervals.clone());
            }
        }

        for change in changed {
            let key = UnitKey::new(group.clone(), change.day);
            match self
                .reconcile_day(target, &key, &change, current.updated_at.as_ref(), &mut committed)
                .await
            {
                Ok(applied) => {
                    committed.per_day.insert(change.day, change.intervals);
                    committed.pending_notify.remove(&change.day);
                    if let Err(e) = self.commit(group, &committed).await {
                        outcome.failures.push(e);
                    }
                    if let Some(applied) = applied {
                        outcome.changes.push(applied);
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    outcome.failures.push(e);
                }
            }
        }

        if let Err(e) = self.commit(group, &committed).await {
            outcome.failures.push(e);
        }

        outcome
    }

    /// Bring one day's calendar in line with `change`.
    ///
    /// `Ok(None)` means the calendar already matched, no notification was
    /// owed, and nothing was sent. The pending mark for the day is written to
    /// `committed` and stored before any calendar mutation.
    async fn reconcile_day(
        &self,
        target: &GroupConfig,
        key: &UnitKey,
        change: &ChangedDay,
        registry_updated_at: Option<&DateTime<FixedOffset>>,
        committed: &mut GroupSnapshot,
    ) -> SyncResult<Option<DayChange>> {
        let desired =
            events::build_desired_events(key, &change.intervals, registry_updated_at, &self.settings)?;
        let window = events::day_window(key, &self.settings.timezone)?;

        let observed = self
            .calendar
            .list_events(&target.calendar_id, &window)
            .await
            .map_err(|source| SyncError::CalendarList {
                key: key.clone(),
                source,
            })?;

        let diff = reconcile(&observed, &desired);
        let owed = committed.pending_notify.contains(&key.day);
        if diff.is_empty() && !owed {
            tracing::debug!("Calendar for {} already up to date", key);
            return Ok(None);
        }

        if !diff.is_empty() && !owed {
            committed.pending_notify.insert(key.day);
            self.commit(&key.group, committed).await?;
        }

        for stale in &diff.to_delete {
            self.calendar
                .delete_event(&target.calendar_id, &stale.id)
                .await
                .map_err(|source| SyncError::CalendarDelete {
                    key: key.clone(),
                    event_id: stale.id.clone(),
                    source,
                })?;
        }

        for missing in &diff.to_add {
            self.calendar
                .insert_event(&target.calendar_id, missing)
                .await
                .map_err(|source| SyncError::CalendarInsert {
                    key: key.clone(),
                    source,
                })?;
        }

        let notification = Notification {
            group: key.group.clone(),
            day: key.day,
            events: desired,
            registry_updated_at: registry_updated_at.copied(),
        };
        self.notifier
            .notify(&notification)
            .await
            .map_err(|source| SyncError::Notify {
                key: key.clone(),
                source,
            })?;

        if diff.is_empty() {
            tracing::info!("Delivered pending notification for {}", key);
        } else {
            tracing::info!(
                "Updated {}: {} removed, {} added",
                key,
                diff.to_delete.len(),
                diff.to_add.len()
            );
        }

        Ok(Some(DayChange {
            day: key.day,
            deleted: diff.to_delete,
            added: diff.to_add,
            notification,
        }))
    }

    async fn commit(&self, group: &GroupId, snapshot: &GroupSnapshot) -> SyncResult<()> {
        self.store
            .put(group, snapshot.clone())
            .await
            .map_err(|source| {
                tracing::error!("Failed to store snapshot for group {}: {:#}", group, source);
                SyncError::Store {
                    group: group.clone(),
                    source,
                }
            })
    }
}
