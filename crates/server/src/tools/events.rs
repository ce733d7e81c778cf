//! sw_push, sw_sync and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{EventOutcome, Worker, WorkerEvent};

use super::{json_result, unexpected};
use crate::error::ToolError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload, normally JSON with `title`, `body` and `url`.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    pub tag: String,
    /// Deliver as a periodic sync instead of a one-off sync.
    #[serde(default)]
    pub periodic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncOutput {
    pub tag: String,
    pub periodic: bool,
    pub handled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// URL carried by the notification, absolute or relative to the app.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenWindowOutput {
    pub open_window: String,
}

pub async fn push_impl(worker: &Worker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    match worker.dispatch(WorkerEvent::Push { payload: params.payload }).await {
        EventOutcome::Notify(notification) => json_result(&notification),
        other => Err(unexpected(other)),
    }
}

pub async fn sync_impl(worker: &Worker, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.trim().to_string();
    if tag.is_empty() {
        return Err(ToolError::InvalidInput("tag cannot be empty".into()).into());
    }

    let event = if params.periodic {
        WorkerEvent::PeriodicSync { tag: tag.clone() }
    } else {
        WorkerEvent::Sync { tag: tag.clone() }
    };

    match worker.dispatch(event).await {
        EventOutcome::Ignored => json_result(&SyncOutput { tag, periodic: params.periodic, handled: true }),
        other => Err(unexpected(other)),
    }
}

pub async fn notification_click_impl(
    worker: &Worker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    match worker.dispatch(WorkerEvent::NotificationClick { url: params.url }).await {
        EventOutcome::OpenWindow { url } => json_result(&OpenWindowOutput { open_window: url }),
        other => Err(unexpected(other)),
    }
}
