//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Command, EventOutcome, Worker, WorkerEvent};

use super::{json_result, unexpected};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Command object tagged by `type`: SKIP_WAITING, GET_VERSION,
    /// CLEAR_CACHE, or CACHE_URLS with `urls`.
    pub command: Command,
}

pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    match worker.dispatch(WorkerEvent::Message(params.command)).await {
        EventOutcome::Replied(reply) => json_result(&reply),
        other => Err(unexpected(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, worker};
    use swcache_client::MessageReply;

    fn params(json: &str) -> SwMessageParams {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_get_version() {
        let worker = worker().await;
        let result = message_impl(&worker, params(r#"{"command":{"type":"GET_VERSION"}}"#)).await.unwrap();
        let reply: MessageReply = output(&result);
        assert_eq!(reply, MessageReply::Version { version: "v1".into() });
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let worker = worker().await;
        worker.context().cache.open_store("pdf-tools-precache-v1").await.unwrap();

        let result = message_impl(&worker, params(r#"{"command":{"type":"CLEAR_CACHE"}}"#)).await.unwrap();
        let reply: MessageReply = output(&result);
        assert_eq!(reply, MessageReply::Cleared { success: true, deleted: vec!["pdf-tools-precache-v1".into()] });
    }

    #[tokio::test]
    async fn test_cache_urls_unreachable_are_skipped() {
        let worker = worker().await;
        let json = r#"{"command":{"type":"CACHE_URLS","urls":["/docs/a.pdf"]}}"#;
        let result = message_impl(&worker, params(json)).await.unwrap();
        let reply: MessageReply = output(&result);
        assert_eq!(reply, MessageReply::Cached { cached: 0, skipped: vec!["http://127.0.0.1:9/docs/a.pdf".into()] });
    }
}
