//! Push messages and notification clicks.

use std::sync::atomic::{AtomicU64, Ordering};

use axioma_core::Error;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{ClientInfo, Worker};

const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Unix milliseconds.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
}

/// Notifications currently on screen.
///
/// A notification leaves only through `close`, which a click performs.
/// Notifications nobody clicks stay listed for the worker's lifetime.
#[derive(Debug)]
pub struct NotificationCenter {
    next_id: AtomicU64,
    shown: Mutex<Vec<Notification>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), shown: Mutex::new(Vec::new()) }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn show(&self, notification: Notification) {
        self.shown.lock().await.push(notification);
    }

    /// Remove a notification. Returns it if it was on screen.
    pub async fn close(&self, id: u64) -> Option<Notification> {
        let mut shown = self.shown.lock().await;
        let index = shown.iter().position(|n| n.id == id)?;
        Some(shown.remove(index))
    }

    pub async fn shown(&self) -> Vec<Notification> {
        self.shown.lock().await.clone()
    }
}

impl Worker {
    /// Show a notification for a push message.
    ///
    /// The body is the payload text, or the configured default when the
    /// push carried no payload.
    pub async fn handle_push(&self, payload: Option<&str>) -> Notification {
        let settings = &self.config.notification;
        let notification = Notification {
            id: self.notifications.next_id(),
            title: settings.title.clone(),
            body: payload.map_or_else(|| settings.default_body.clone(), str::to_string),
            icon: settings.icon.clone(),
            badge: settings.badge.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            data: NotificationData { date_of_arrival: chrono::Utc::now().timestamp_millis(), primary_key: 1 },
        };

        tracing::info!(id = notification.id, "showing push notification");
        self.notifications.show(notification.clone()).await;
        notification
    }

    /// Dismiss the notification and open (or focus) the site root.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` if no notification with `id` is on screen.
    pub async fn handle_notification_click(&self, id: u64) -> Result<ClientInfo, Error> {
        self.notifications
            .close(id)
            .await
            .ok_or_else(|| Error::InvalidInput(format!("no notification with id {id}")))?;

        let root = self.resolve("/")?;
        Ok(self.clients.open_window(root.as_str()).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axioma_core::{AppConfig, NotificationConfig};

    use super::super::test_support::*;
    use super::*;
    use crate::testing::MockNetwork;

    #[tokio::test]
    async fn test_push_with_payload() {
        let worker = worker_with(&app_config(), Arc::new(MockNetwork::new())).await;

        let shown = worker.handle_push(Some("Quarterly report is out")).await;
        assert_eq!(shown.title, "Axioma Capital");
        assert_eq!(shown.body, "Quarterly report is out");
        assert_eq!(shown.icon, "/icon-192.png");
        assert_eq!(shown.badge, "/badge-72.png");
        assert_eq!(shown.vibrate, vec![100, 50, 100]);
        assert_eq!(shown.data.primary_key, 1);
        assert!(shown.data.date_of_arrival > 0);
        assert_eq!(worker.notifications().shown().await, vec![shown]);
    }

    #[tokio::test]
    async fn test_push_without_payload_uses_default_body() {
        let config = AppConfig {
            notification: NotificationConfig { default_body: "Hello".into(), ..Default::default() },
            ..app_config()
        };
        let worker = worker_with(&config, Arc::new(MockNetwork::new())).await;

        let shown = worker.handle_push(None).await;
        assert_eq!(shown.body, "Hello");
    }

    #[tokio::test]
    async fn test_click_closes_and_opens_root() {
        let worker = worker_with(&app_config(), Arc::new(MockNetwork::new())).await;
        let shown = worker.handle_push(None).await;

        let client = worker.handle_notification_click(shown.id).await.unwrap();
        assert_eq!(client.url, url("/"));
        assert!(worker.notifications().shown().await.is_empty());
    }

    #[tokio::test]
    async fn test_unclicked_notifications_stay_listed() {
        let worker = worker_with(&app_config(), Arc::new(MockNetwork::new())).await;
        let first = worker.handle_push(Some("one")).await;
        let second = worker.handle_push(Some("two")).await;

        worker.handle_notification_click(first.id).await.unwrap();
        assert_eq!(worker.notifications().shown().await, vec![second]);
    }

    #[tokio::test]
    async fn test_click_unknown_notification() {
        let worker = worker_with(&app_config(), Arc::new(MockNetwork::new())).await;
        let result = worker.handle_notification_click(99).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
