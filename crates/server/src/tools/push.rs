//! push_notify and notification_click tool implementations.

use axioma_client::{Notification, Worker};
use axioma_client::worker::ClientInfo;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for push_notify tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushNotifyParams {
    /// Push payload text. The configured default body is shown when absent.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Output from push_notify tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotifyOutput {
    pub notification: Notification,
}

/// Input parameters for notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Id returned by push_notify.
    pub id: u64,
}

/// Output from notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationClickOutput {
    /// The window that was opened or focused.
    pub client: ClientInfo,
}

/// Implementation of the push_notify tool.
pub async fn push_impl(worker: &Worker, params: PushNotifyParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.payload.as_deref()).await;
    json_result(&PushNotifyOutput { notification })
}

/// Implementation of the notification_click tool.
pub async fn click_impl(worker: &Worker, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let client = worker.handle_notification_click(params.id).await?;
    json_result(&NotificationClickOutput { client })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axioma_client::testing::MockNetwork;

    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_push_then_click_opens_root() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network).await;

        let result = push_impl(&worker, PushNotifyParams { payload: Some("Rates updated".into()) }).await.unwrap();
        let pushed: PushNotifyOutput = output(&result);
        assert_eq!(pushed.notification.body, "Rates updated");
        assert_eq!(pushed.notification.vibrate, vec![100, 50, 100]);

        let result = click_impl(&worker, NotificationClickParams { id: pushed.notification.id }).await.unwrap();
        let clicked: NotificationClickOutput = output(&result);
        assert_eq!(clicked.client.url, url("/"));
        assert!(clicked.client.controlled);
    }

    #[tokio::test]
    async fn test_push_without_payload() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network).await;

        let result = push_impl(&worker, PushNotifyParams { payload: None }).await.unwrap();
        let pushed: PushNotifyOutput = output(&result);
        assert_eq!(pushed.notification.body, "New notification");
    }

    #[tokio::test]
    async fn test_click_twice_fails() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network).await;
        let notification = worker.handle_push(None).await;

        click_impl(&worker, NotificationClickParams { id: notification.id }).await.unwrap();
        let err = click_impl(&worker, NotificationClickParams { id: notification.id }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
