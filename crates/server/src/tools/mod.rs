//! MCP tool implementations.
//!
//! Each tool is a thin adapter: parse parameters, call the worker, encode
//! the result as pretty JSON text content.

pub mod cache;
pub mod fetch;
pub mod message;
pub mod push;
pub mod status;
pub mod sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Encode a tool output as a successful JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
