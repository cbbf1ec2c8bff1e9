//! background_sync tool implementation.

use axioma_client::{RefreshReport, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for background_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundSyncParams {
    /// Sync tag. Only "update-cache" does anything.
    pub tag: String,
}

/// Output from background_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundSyncOutput {
    pub tag: String,
    /// Whether the tag was recognised.
    pub handled: bool,
    pub report: Option<RefreshReport>,
}

/// Implementation of the background_sync tool.
pub async fn sync_impl(worker: &Worker, params: BackgroundSyncParams) -> Result<CallToolResult, McpError> {
    let report = worker.handle_sync(&params.tag).await?;
    json_result(&BackgroundSyncOutput { tag: params.tag, handled: report.is_some(), report })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axioma_client::testing::MockNetwork;
    use axioma_client::worker::UPDATE_CACHE_TAG;

    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_update_cache_refreshes() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        network.respond(&url("/"), 200, "fresh home");

        let result = sync_impl(&worker, BackgroundSyncParams { tag: UPDATE_CACHE_TAG.into() }).await.unwrap();
        let output: BackgroundSyncOutput = output(&result);

        assert!(output.handled);
        let report = output.report.unwrap();
        assert_eq!(report.stored.len(), 3);
        assert!(report.failed.is_empty());

        let home = worker.db().match_entry(worker.cache_name(), "GET", &url("/")).await.unwrap().unwrap();
        assert_eq!(home.body, b"fresh home");
    }

    #[tokio::test]
    async fn test_unknown_tag_not_handled() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;

        let result = sync_impl(&worker, BackgroundSyncParams { tag: "outbox".into() }).await.unwrap();
        let output: BackgroundSyncOutput = output(&result);
        assert!(!output.handled);
        assert!(network.calls().is_empty());
    }
}
