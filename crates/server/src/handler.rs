//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use axioma_client::{MessagePort, Worker};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::tools::{
    cache::{CacheKeysParams, CacheMatchParams, keys_impl, match_impl},
    fetch::{ResourceFetchParams, fetch_impl},
    message::{WorkerMessageParams, message_impl},
    push::{NotificationClickParams, PushNotifyParams, click_impl, push_impl},
    status::status_impl,
    sync::{BackgroundSyncParams, sync_impl},
};

/// The main MCP server handler for axioma-cache.
#[derive(Clone)]
pub struct AxiomaCacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker>,
    port: MessagePort,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl AxiomaCacheServer {
    /// Create a new server handler around a started worker and its message port.
    pub fn new(worker: Arc<Worker>, port: MessagePort) -> Self {
        Self { tool_router: Self::tool_router(), worker, port }
    }

    /// Fetch a resource through the worker.
    ///
    /// Same-origin requests are routed by the strategy table once the worker
    /// is activated; others go to the network untouched.
    #[tool(
        description = "Fetch a resource through the caching worker. Returns status, body, and whether it came from cache, network, or an offline fallback."
    )]
    async fn resource_fetch(&self, params: Parameters<ResourceFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a maintenance command to the worker: skipWaiting, clearCache, or getCacheSize.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.port, params.0).await
    }

    #[tool(description = "Look up a cached GET response by URL, in one store or across all stores.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores and the requests each one holds.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. Shows a notification and returns it with its id.")]
    async fn push_notify(&self, params: Parameters<PushNotifyParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a shown notification. Closes it and opens or focuses the site root.")]
    async fn notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync event. The update-cache tag refreshes the critical resources.")]
    async fn background_sync(&self, params: Parameters<BackgroundSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the worker's lifecycle state, stores, clients, and open notifications.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }
}

impl ServerHandler for AxiomaCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "axioma-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
