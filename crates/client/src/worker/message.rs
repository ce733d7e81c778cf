//! Commands posted to the worker by the page.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

use super::WorkerContext;
use super::lifecycle::{self, SkipWaiting, cache_all};
use crate::fetch::resolve;

/// A message command, tagged by `type`:
///
/// ```json
/// {"type": "CACHE_URLS", "urls": ["/docs/guide.pdf"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    SkipWaiting,
    GetVersion,
    ClearCache,
    CacheUrls {
        #[serde(alias = "payload")]
        urls: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageReply {
    /// `deferred` is set when the worker was still installing; it activates
    /// as soon as the install finishes.
    Ack {
        activated: bool,
        #[serde(default)]
        deferred: bool,
    },
    Version { version: String },
    Cleared { success: bool, deleted: Vec<String> },
    Cached { cached: usize, skipped: Vec<String> },
}

pub async fn handle(ctx: &WorkerContext, command: Command) -> Result<MessageReply, Error> {
    match command {
        Command::SkipWaiting => {
            let outcome = lifecycle::skip_waiting(ctx).await?;
            Ok(MessageReply::Ack {
                activated: outcome == SkipWaiting::Activated,
                deferred: outcome == SkipWaiting::Deferred,
            })
        }
        Command::GetVersion => Ok(MessageReply::Version { version: ctx.version.clone() }),
        Command::ClearCache => match ctx.cache.clear_stores().await {
            Ok(deleted) => {
                tracing::info!(count = deleted.len(), "cleared all stores");
                Ok(MessageReply::Cleared { success: true, deleted })
            }
            Err(e) => {
                tracing::error!(error = %e, "clearing stores failed");
                Ok(MessageReply::Cleared { success: false, deleted: Vec::new() })
            }
        },
        Command::CacheUrls { urls } => cache_urls(ctx, &urls).await,
    }
}

async fn cache_urls(ctx: &WorkerContext, inputs: &[String]) -> Result<MessageReply, Error> {
    let mut skipped = Vec::new();
    let mut urls = Vec::with_capacity(inputs.len());
    for input in inputs {
        match resolve(&ctx.origin, input) {
            Ok(url) => urls.push(url),
            Err(e) => {
                tracing::warn!(url = %input, error = %e, "skipping unresolvable url");
                skipped.push(input.clone());
            }
        }
    }

    let result = cache_all(ctx, &ctx.stores.runtime, &urls).await?;
    skipped.extend(result.skipped);
    Ok(MessageReply::Cached { cached: result.cached, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubNetwork;
    use crate::router::Intercept;
    use crate::strategy::ResponseSource;
    use crate::worker::tests::worker;
    use crate::worker::{EventOutcome, LifecycleState, WorkerEvent};
    use std::sync::Arc;
    use swcache_core::{Request, Response};

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(cmd, Command::SkipWaiting);

        let cmd: Command = serde_json::from_str(r#"{"type":"GET_VERSION"}"#).unwrap();
        assert_eq!(cmd, Command::GetVersion);

        let cmd: Command = serde_json::from_str(r#"{"type":"CACHE_URLS","payload":["/a.pdf"]}"#).unwrap();
        assert_eq!(cmd, Command::CacheUrls { urls: vec!["/a.pdf".into()] });

        assert!(serde_json::from_str::<Command>(r#"{"type":"REBOOT"}"#).is_err());
    }

    #[test]
    fn test_reply_serializes_tagged() {
        let json = serde_json::to_value(MessageReply::Version { version: "v1".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "version", "version": "v1"}));
    }

    #[tokio::test]
    async fn test_get_version() {
        let worker = worker(Arc::new(StubNetwork::new())).await;
        let reply = handle(worker.context(), Command::GetVersion).await.unwrap();
        assert_eq!(reply, MessageReply::Version { version: "v1".into() });
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install_is_noop() {
        let worker = worker(Arc::new(StubNetwork::new())).await;
        let reply = handle(worker.context(), Command::SkipWaiting).await.unwrap();
        assert_eq!(reply, MessageReply::Ack { activated: false, deferred: false });
        assert_eq!(worker.context().state().await, LifecycleState::Parsed);
    }

    #[tokio::test]
    async fn test_skip_waiting_after_install_activates() {
        let worker = worker(Arc::new(StubNetwork::new())).await;
        worker.dispatch(WorkerEvent::Install).await;

        let outcome = worker.dispatch(WorkerEvent::Message(Command::SkipWaiting)).await;
        assert_eq!(outcome, EventOutcome::Replied(MessageReply::Ack { activated: true, deferred: false }));
        assert_eq!(worker.context().state().await, LifecycleState::Activated);
    }

    #[tokio::test]
    async fn test_cache_urls_into_runtime_store() {
        let network = Arc::new(
            StubNetwork::new().with("https://pdf.example.com/docs/guide.pdf", Response::with_content(200, "application/pdf", "%PDF")),
        );
        let worker = worker(network).await;
        let ctx = worker.context();

        let command = Command::CacheUrls {
            urls: vec!["/docs/guide.pdf".into(), "/missing.pdf".into(), "javascript:alert(1)".into()],
        };
        let reply = handle(ctx, command).await.unwrap();
        let MessageReply::Cached { cached, skipped } = reply else {
            panic!("expected Cached reply");
        };
        assert_eq!(cached, 1);
        assert_eq!(skipped, vec!["javascript:alert(1)".to_string(), "https://pdf.example.com/missing.pdf".to_string()]);

        let request = Request::parse("https://pdf.example.com/docs/guide.pdf").unwrap();
        assert!(ctx.cache.match_entry(&ctx.stores.runtime, &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_cache_then_request_goes_to_network() {
        let network = Arc::new(
            StubNetwork::new().with("https://pdf.example.com/js/app.js", Response::with_content(200, "application/javascript", "fresh")),
        );
        let worker = worker(network.clone()).await;
        let ctx = worker.context();
        let request = Request::parse("https://pdf.example.com/js/app.js").unwrap();
        ctx.cache
            .put_entry(&ctx.stores.precache, &request, &Response::with_content(200, "application/javascript", "old"))
            .await
            .unwrap();

        let reply = handle(ctx, Command::ClearCache).await.unwrap();
        let MessageReply::Cleared { success, deleted } = reply else {
            panic!("expected Cleared reply");
        };
        assert!(success);
        assert_eq!(deleted, vec!["pdf-tools-precache-v1".to_string()]);
        assert!(ctx.cache.store_names().await.unwrap().is_empty());

        let Intercept::Respond { served, .. } = worker.fetch(request).await else {
            panic!("expected a response");
        };
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body_text(), "fresh");
        assert_eq!(network.call_count(), 1);
    }
}
