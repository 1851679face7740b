//! Reconciliation engine for planned power-outage schedules.
//!
//! Raw feed slots are compacted into outage intervals, diffed against the
//! last committed snapshot per group, and the changed days are mirrored
//! into a calendar with minimal add/delete operations.

pub mod calendar;
pub mod compact;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod notify;
pub mod orchestrator;
pub mod ports;
pub mod reconcile;
pub mod snapshot;

pub use compact::compact;
pub use error::{FeedError, SyncError, SyncResult};
pub use feed::FeedPayload;
pub use orchestrator::{DayChange, GroupReconciliationOutcome, Orchestrator};
pub use ports::{CalendarPort, DayWindow, Notification, Notifier};
pub use reconcile::reconcile;
pub use snapshot::{diff, InMemorySnapshotStore, SnapshotStore};
