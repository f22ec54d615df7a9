//! Push notification trait and batched delivery

use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tracing::{error, info};

use crate::version::error::NotifyError;

/// One outbound push, covering one notification group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Group name
    pub title: String,
    /// Newline-joined message lines
    pub body: String,
    /// History bucket the push app files this message under
    pub archive_group: String,
    pub icon: Option<String>,
    /// Image shared by every app in the batch
    pub image: Option<String>,
}

/// Trait for delivering notifications to a push service
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sends each notification in order, pausing `interval` between sends.
///
/// Failures are logged and do not stop later sends. Returns how many were delivered.
pub async fn deliver_all(
    notifier: &dyn Notifier,
    notifications: &[Notification],
    interval: Duration,
) -> usize {
    let mut delivered = 0;
    for (i, notification) in notifications.iter().enumerate() {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        info!(
            "Sending {} (archive: {})",
            notification.title, notification.archive_group
        );
        match notifier.send(notification).await {
            Ok(()) => delivered += 1,
            Err(e) => error!("Failed to deliver {}: {}", notification.title, e),
        }
    }
    delivered
}
