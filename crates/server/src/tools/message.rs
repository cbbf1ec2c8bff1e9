//! worker_message tool implementation.
//!
//! Posts a maintenance command to the worker's message loop and waits for
//! the reply, if the command has one.

use axioma_client::{Command, MessagePort, Reply};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// One of "skipWaiting", "clearCache", "getCacheSize".
    pub action: String,
}

/// Output from worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerMessageOutput {
    pub action: String,
    /// `{"cleared": true}` or `{"size": <bytes>}`; absent for skipWaiting.
    pub reply: Option<Reply>,
}

fn parse_command(action: &str) -> Result<Command, ToolError> {
    serde_json::from_value(serde_json::json!({ "action": action }))
        .map_err(|_| ToolError::InvalidInput(format!("unknown action: {action}")))
}

/// Implementation of the worker_message tool.
pub async fn message_impl(port: &MessagePort, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let command = parse_command(params.action.trim())?;
    let reply = port.post(command).await?;

    json_result(&WorkerMessageOutput { action: params.action, reply })
}
