//! worker_status tool implementation.

use axioma_client::worker::ClientInfo;
use axioma_client::{Notification, Worker, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatusOutput {
    pub state: WorkerState,
    pub cache_name: String,
    pub skip_waiting: bool,
    /// Every store in the database, oldest first.
    pub stores: Vec<String>,
    pub clients: Vec<ClientInfo>,
    /// Notifications still on screen.
    pub notifications: Vec<Notification>,
}

/// Implementation of the worker_status tool.
pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let output = WorkerStatusOutput {
        state: worker.state().await,
        cache_name: worker.cache_name().to_string(),
        skip_waiting: worker.skip_waiting_requested(),
        stores: worker.db().store_names().await?,
        clients: worker.clients().list().await,
        notifications: worker.notifications().shown().await,
    };

    json_result(&output)
}
