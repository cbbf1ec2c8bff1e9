//! cache_match tool implementation.
//!
//! Looks a request up in the stores without touching the network.

use axioma_client::Worker;
use axioma_core::{Error, StoredResponse};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Root-relative path or absolute URL.
    pub url: String,

    /// Store to search. Searches every store when omitted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMatchOutput {
    /// The matching entry.
    pub entry: StoredResponse,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(worker: &Worker, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let db = worker.db();

    let entry = match &params.store {
        Some(store) => db.match_entry(store, "GET", url.as_str()).await?,
        None => db.match_any("GET", url.as_str()).await?,
    }
    .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    json_result(&CacheMatchOutput { entry })
}
