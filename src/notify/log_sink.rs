//! Sink that only logs, for runs that must not post anywhere.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Notification;
use crate::notify::NotificationSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        log::info!(
            "Notification ({}) for {}: {}",
            notification.kind(),
            notification.competition().id,
            serde_json::to_string(notification)?
        );
        Ok(())
    }
}
