//! cache_keys tool implementation.
//!
//! Lists stores and the requests each one holds.

use axioma_client::Worker;
use axioma_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Only list this store.
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreKeys {
    pub name: String,
    /// `METHOD URL` per entry.
    pub requests: Vec<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKeysOutput {
    pub stores: Vec<StoreKeys>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &Worker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let db = worker.db();

    let names = match params.store {
        Some(store) => {
            if !db.has_store(&store).await? {
                return Err(Error::CacheMiss(format!("no store named {store}")).into());
            }
            vec![store]
        }
        None => db.store_names().await?,
    };

    let mut stores = Vec::with_capacity(names.len());
    for name in names {
        let requests = db
            .entry_keys(&name)
            .await?
            .into_iter()
            .map(|(method, url)| format!("{method} {url}"))
            .collect();
        stores.push(StoreKeys { name, requests });
    }

    json_result(&CacheKeysOutput { stores })
}
