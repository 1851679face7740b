use anyhow::Result;
use async_trait::async_trait;

use crate::ports::{Notification, Notifier};

/// Writes notifications to the log instead of a chat
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if notification.events.is_empty() {
            tracing::info!(
                "Group {}: no planned outages on {}",
                notification.group,
                notification.day
            );
            return Ok(());
        }

        tracing::info!(
            "Group {}: {} planned outage(s) on {}",
            notification.group,
            notification.events.len(),
            notification.day
        );
        for event in &notification.events {
            tracing::info!("  {} - {}", event.start_iso, event.end_iso);
        }
        Ok(())
    }
}
