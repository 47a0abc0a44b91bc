//! Notification delivery.
//!
//! The pipeline hands [`Notification`] payloads to a [`NotificationSink`];
//! each sink decides how to render and where to deliver them.

pub mod discord;
pub mod log_sink;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Notification;

pub use discord::DiscordSink;
pub use log_sink::LogSink;

/// Destination for notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}
