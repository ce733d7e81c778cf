//! MCP tool implementations.
//!
//! Each tool turns its parameters into a worker event (or a direct store
//! read), then renders the result as pretty-printed JSON text.

pub mod cache;
pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod message;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_client::EventOutcome;

use crate::error::ToolError;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Error for an outcome the calling tool did not ask for.
pub(crate) fn unexpected(outcome: EventOutcome) -> McpError {
    match outcome {
        EventOutcome::Failed { reason } => ToolError::HandlerFailed(reason).into(),
        other => ToolError::UnexpectedOutcome(format!("{other:?}")).into(),
    }
}
