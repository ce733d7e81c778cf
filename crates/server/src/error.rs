//! Tool-boundary errors for the swcache host.
//!
//! Library errors already convert into [`McpError`]; these cover failures
//! that only exist at the tool surface.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid tool parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The worker absorbed a handler failure.
    #[error("HANDLER_FAILED: {0}")]
    HandlerFailed(String),

    /// The worker answered an event with an unexpected outcome.
    #[error("UNEXPECTED_OUTCOME: {0}")]
    UnexpectedOutcome(String),

    #[error("ENCODE_FAILED: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::HandlerFailed(_) => -32000,
            ToolError::UnexpectedOutcome(_) | ToolError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
