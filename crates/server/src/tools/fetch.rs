//! resource_fetch tool implementation.
//!
//! Sends a request through the worker exactly as a page would: same-origin
//! requests to an activated worker are routed by strategy, everything else
//! goes straight to the network.

use axioma_client::{ResourceRequest, ResponseSource, Strategy, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFetchParams {
    /// Root-relative path or absolute URL.
    pub url: String,

    /// HTTP method (default: "GET"). Only GET responses are cached.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from resource_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFetchOutput {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub source: ResponseSource,
    /// Strategy that handled the request; absent when not intercepted.
    pub strategy: Option<Strategy>,
    pub content_type: Option<String>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
    pub body_bytes: usize,
    /// When the served entry was stored, for cached responses.
    pub cached_at: Option<String>,
    /// A background refresh was started for this entry.
    pub revalidating: bool,
}

/// Implementation of the resource_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: ResourceFetchParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let request = ResourceRequest::new(&params.method, url)?;

    let served = worker.fetch(&request).await?;
    let response = served.response;

    let output = ResourceFetchOutput {
        url: response.url.clone(),
        method: request.method.to_string(),
        status: response.status,
        source: served.source,
        strategy: served.strategy,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        cached_at: response.cached_at.clone(),
        revalidating: served.revalidation.is_some(),
    };

    json_result(&output)
}
