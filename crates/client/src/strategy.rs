//! The three caching strategies.
//!
//! Every strategy is infallible from the caller's point of view: cache
//! errors count as misses, network errors move to the next fallback tier,
//! and the last tier is always an offline placeholder.
//!
//! | strategy | reads | writes |
//! |---|---|---|
//! | cache-first | precache, runtime | precache |
//! | network-first | runtime (on network failure) | runtime |
//! | stale-while-revalidate | runtime, precache | runtime |
//!
//! Stale-while-revalidate reads the runtime store first so that a refreshed
//! copy shadows a precached one on the next request.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Request, Response, StoreNames};
use tokio::task::JoinHandle;

use crate::fetch::Network;
use crate::offline::OfflinePolicy;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn cache(response: Response) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    fn network(response: Response) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    fn offline(response: Response) -> Self {
        Self { response, source: ResponseSource::Offline }
    }
}

/// Handles every strategy needs, passed explicitly.
#[derive(Clone)]
pub struct StrategyContext {
    pub cache: CacheDb,
    pub network: Arc<dyn Network>,
    pub stores: StoreNames,
    pub offline: OfflinePolicy,
    /// Refresh cache-first hits in the background.
    pub refresh_on_hit: bool,
}

impl StrategyContext {
    async fn lookup(&self, stores: &[&str], request: &Request) -> Option<Response> {
        match self.cache.match_in(stores, request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss");
                None
            }
        }
    }

    async fn store(&self, store: &str, request: &Request, response: &Response) {
        if let Err(e) = self.cache.put_entry(store, request, response).await {
            tracing::warn!(url = %request.url, store, error = %e, "cache write failed");
        }
    }

    /// Fetch from the network and store a complete copy in `store`.
    ///
    /// Everything else is returned but never cached; see [`storable`].
    async fn fetch_and_store(&self, store: &str, request: &Request) -> Result<Response, swcache_core::Error> {
        let response = self.network.fetch(request).await?;
        if storable(request, &response) {
            self.store(store, request, &response).await;
        }
        Ok(response)
    }

    async fn offline(&self, request: &Request) -> Served {
        Served::offline(self.offline.respond(&self.cache, &self.stores, request).await)
    }
}

/// Whether a network response may be written to a store: a full 2xx body
/// for a request that did not ask for a byte range. A partial body stored
/// under the plain request key would be served as the whole resource.
pub(crate) fn storable(request: &Request, response: &Response) -> bool {
    !request.is_range() && response.is_storable()
}

/// Log a network failure before falling back. Anything that is not a
/// network-tier error points at a local fault and is logged louder.
fn log_fallback(request: &Request, error: &swcache_core::Error, message: &'static str) {
    if error.is_network() {
        tracing::debug!(url = %request.url, error = %error, "{message}");
    } else {
        tracing::warn!(url = %request.url, error = %error, "{message}");
    }
}

/// Refresh `request` into `store` on a detached task.
///
/// The caller cannot observe the outcome; failures are logged at debug and
/// dropped. Concurrent writers to the same key are last-write-wins.
pub fn spawn_refresh(ctx: StrategyContext, store: String, request: Request) -> JoinHandle<()> {
    tokio::spawn(async move {
        match ctx.fetch_and_store(&store, &request).await {
            Ok(response) => {
                tracing::debug!(url = %request.url, store = %store, status = response.status, "background refresh")
            }
            Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
        }
    })
}

/// Serve from the versioned stores, else network (caching 2xx into the
/// precache store), else the offline placeholder.
pub async fn cache_first(ctx: &StrategyContext, request: &Request) -> Served {
    if let Some(hit) = ctx.lookup(&ctx.stores.all(), request).await {
        if ctx.refresh_on_hit {
            spawn_refresh(ctx.clone(), ctx.stores.precache.clone(), request.clone());
        }
        return Served::cache(hit);
    }

    match ctx.fetch_and_store(&ctx.stores.precache, request).await {
        Ok(response) => Served::network(response),
        Err(e) => {
            log_fallback(request, &e, "cache-first miss and network failed");
            ctx.offline(request).await
        }
    }
}

/// Network (caching 2xx into the runtime store), else the runtime store,
/// else the offline placeholder.
pub async fn network_first(ctx: &StrategyContext, request: &Request) -> Served {
    match ctx.fetch_and_store(&ctx.stores.runtime, request).await {
        Ok(response) => Served::network(response),
        Err(e) => {
            log_fallback(request, &e, "network-first falling back to cache");
            match ctx.lookup(&[ctx.stores.runtime.as_str()], request).await {
                Some(hit) => Served::cache(hit),
                None => ctx.offline(request).await,
            }
        }
    }
}

/// Cached copy immediately with a detached refresh; without a cached copy,
/// await the network, else the offline placeholder.
pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &Request) -> Served {
    let stores = [ctx.stores.runtime.as_str(), ctx.stores.precache.as_str()];
    if let Some(hit) = ctx.lookup(&stores, request).await {
        spawn_refresh(ctx.clone(), ctx.stores.runtime.clone(), request.clone());
        return Served::cache(hit);
    }

    match ctx.fetch_and_store(&ctx.stores.runtime, request).await {
        Ok(response) => Served::network(response),
        Err(e) => {
            log_fallback(request, &e, "stale-while-revalidate miss and network failed");
            ctx.offline(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fetch::stub::StubNetwork;
    use swcache_core::Destination;

    const APP: &str = "https://pdf.example.com";
    const PDF_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js";

    fn stores() -> StoreNames {
        StoreNames::for_version("pdf-tools", "v1")
    }

    async fn context(network: Arc<StubNetwork>) -> StrategyContext {
        StrategyContext {
            cache: CacheDb::open_in_memory().await.unwrap(),
            network,
            stores: stores(),
            offline: OfflinePolicy::new(Request::parse(&format!("{APP}/index.html")).unwrap()),
            refresh_on_hit: false,
        }
    }

    fn js(body: &str) -> Response {
        Response::with_content(200, "application/javascript", body)
    }

    /// Wait for a detached refresh to land in the store.
    async fn wait_for_body(ctx: &StrategyContext, store: &str, request: &Request, body: &str) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Ok(Some(hit)) = ctx.cache.match_entry(store, request).await
                    && hit.body_text() == body
                {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("refresh did not land");
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone()).await;
        let request = Request::parse(&format!("{APP}/js/app.js")).unwrap();
        ctx.cache.put_entry(&ctx.stores.precache, &request, &js("cached")).await.unwrap();

        let served = cache_first(&ctx, &request).await;

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body_text(), "cached");
        assert_eq!(network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_hit_in_runtime_store() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone()).await;
        let request = Request::parse(&format!("{APP}/js/extra.js")).unwrap();
        ctx.cache.put_entry(&ctx.stores.runtime, &request, &js("runtime")).await.unwrap();

        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores() {
        let url = format!("{APP}/css/styles.css");
        let network = Arc::new(StubNetwork::new().with(&url, Response::with_content(200, "text/css", "body{}")));
        let ctx = context(network.clone()).await;
        let request = Request::parse(&url).unwrap();

        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Network);

        let stored = ctx.cache.match_entry(&ctx.stores.precache, &request).await.unwrap();
        assert_eq!(stored.unwrap().body_text(), "body{}");

        let again = cache_first(&ctx, &request).await;
        assert_eq!(again.source, ResponseSource::Cache);
        assert_eq!(network.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone()).await;
        let request = Request::parse(&format!("{APP}/missing.js")).unwrap();

        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 404);
        assert!(ctx.cache.match_entry(&ctx.stores.precache, &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_offline_document_without_shell_is_503() {
        let ctx = context(Arc::new(StubNetwork::offline())).await;
        let request = Request::parse(&format!("{APP}/index.html"))
            .unwrap()
            .with_destination(Destination::Document);

        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.status, 503);
        assert_eq!(served.response.body_text(), crate::offline::UNAVAILABLE_BODY);
    }

    #[tokio::test]
    async fn test_cache_first_offline_navigation_gets_shell() {
        let ctx = context(Arc::new(StubNetwork::offline())).await;
        let shell = Response::with_content(200, "text/html", "<html>shell</html>");
        ctx.cache
            .put_entry(&ctx.stores.precache, ctx.offline.app_shell(), &shell)
            .await
            .unwrap();

        let request = Request::parse(&format!("{APP}/tools/merge"))
            .unwrap()
            .with_mode(swcache_core::RequestMode::Navigate);
        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.body_text(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_cache_first_refresh_on_hit() {
        let url = format!("{APP}/js/app.js");
        let network = Arc::new(StubNetwork::new().with(&url, js("fresh")));
        let mut ctx = context(network.clone()).await;
        ctx.refresh_on_hit = true;
        let request = Request::parse(&url).unwrap();
        ctx.cache.put_entry(&ctx.stores.precache, &request, &js("stale")).await.unwrap();

        let served = cache_first(&ctx, &request).await;
        assert_eq!(served.response.body_text(), "stale");

        wait_for_body(&ctx, &ctx.stores.precache, &request, "fresh").await;
    }

    #[tokio::test]
    async fn test_network_first_success_stores_runtime() {
        let url = "https://api.example.org/status.json";
        let network = Arc::new(StubNetwork::new().with(url, Response::with_content(200, "application/json", "{}")));
        let ctx = context(network).await;
        let request = Request::parse(url).unwrap();

        let served = network_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert!(ctx.cache.match_entry(&ctx.stores.runtime, &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_runtime() {
        let url = "https://api.example.org/status.json";
        let ctx = context(Arc::new(StubNetwork::offline())).await;
        let request = Request::parse(url).unwrap();
        ctx.cache
            .put_entry(&ctx.stores.runtime, &request, &Response::with_content(200, "application/json", "{\"ok\":1}"))
            .await
            .unwrap();

        let served = network_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body_text(), "{\"ok\":1}");
    }

    #[tokio::test]
    async fn test_network_first_offline_placeholder() {
        let ctx = context(Arc::new(StubNetwork::offline())).await;
        let request = Request::parse("https://images.example.org/logo.png")
            .unwrap()
            .with_destination(Destination::Image);

        let served = network_first(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.content_type(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_swr_returns_stale_then_updates() {
        let network = Arc::new(StubNetwork::new().with(PDF_JS, js("fresh")));
        let ctx = context(network.clone()).await;
        let request = Request::parse(PDF_JS).unwrap().with_destination(Destination::Script);
        ctx.cache.put_entry(&ctx.stores.runtime, &request, &js("stale")).await.unwrap();

        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body_text(), "stale");

        wait_for_body(&ctx, &ctx.stores.runtime, &request, "fresh").await;
        let next = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(next.response.body_text(), "fresh");
    }

    #[tokio::test]
    async fn test_swr_refresh_shadows_precached_copy() {
        let network = Arc::new(StubNetwork::new().with(PDF_JS, js("fresh")));
        let ctx = context(network).await;
        let request = Request::parse(PDF_JS).unwrap();
        ctx.cache.put_entry(&ctx.stores.precache, &request, &js("precached")).await.unwrap();

        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.response.body_text(), "precached");

        wait_for_body(&ctx, &ctx.stores.runtime, &request, "fresh").await;
        let next = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(next.response.body_text(), "fresh");
    }

    #[tokio::test]
    async fn test_swr_failed_refresh_keeps_cached_copy() {
        let network = Arc::new(StubNetwork::offline());
        let ctx = context(network.clone()).await;
        let request = Request::parse(PDF_JS).unwrap();
        ctx.cache.put_entry(&ctx.stores.runtime, &request, &js("stale")).await.unwrap();

        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.response.body_text(), "stale");

        tokio::time::timeout(Duration::from_secs(2), async {
            while network.call_count() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        let hit = ctx.cache.match_entry(&ctx.stores.runtime, &request).await.unwrap().unwrap();
        assert_eq!(hit.body_text(), "stale");
    }

    #[tokio::test]
    async fn test_swr_miss_awaits_network() {
        let network = Arc::new(StubNetwork::new().with(PDF_JS, js("fresh")));
        let ctx = context(network).await;
        let request = Request::parse(PDF_JS).unwrap();

        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body_text(), "fresh");
        assert!(ctx.cache.match_entry(&ctx.stores.runtime, &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_swr_miss_offline_returns_placeholder() {
        let ctx = context(Arc::new(StubNetwork::offline())).await;
        let request = Request::parse("https://fonts.gstatic.com/s/inter.woff2")
            .unwrap()
            .with_destination(Destination::Font);

        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.status, 503);
    }

    #[tokio::test]
    async fn test_partial_response_never_poisons_cache() {
        let url = format!("{APP}/docs/manual.pdf");
        let partial = Response::with_content(206, "application/pdf", "%PDF-1.7 first 1KB only")
            .with_header("content-range", "bytes 0-1023/500000");
        let network = Arc::new(StubNetwork::new().with(&url, partial));
        let ctx = context(network.clone()).await;

        let ranged = Request::parse(&url).unwrap().with_header("range", "bytes=0-1023");
        let served = cache_first(&ctx, &ranged).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 206);
        assert!(ctx.cache.match_entry(&ctx.stores.precache, &ranged).await.unwrap().is_none());

        let full = Request::parse(&url).unwrap();
        assert!(ctx.cache.match_entry(&ctx.stores.precache, &full).await.unwrap().is_none());
        network.serve(&url, Response::with_content(200, "application/pdf", "%PDF-1.7 whole document"));

        let served = cache_first(&ctx, &full).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 200);
        assert_eq!(network.calls(), vec![url.clone(), url.clone()]);

        let stored = ctx.cache.match_entry(&ctx.stores.precache, &full).await.unwrap().unwrap();
        assert_eq!(stored.body_text(), "%PDF-1.7 whole document");
    }

    #[tokio::test]
    async fn test_network_first_and_swr_skip_partial_content() {
        let partial = Response::with_content(206, "application/javascript", "part")
            .with_header("content-range", "bytes 0-3/100");
        let network = Arc::new(StubNetwork::new().with(PDF_JS, partial));
        let ctx = context(network).await;
        let request = Request::parse(PDF_JS).unwrap();

        let served = network_first(&ctx, &request).await;
        assert_eq!(served.response.status, 206);
        let served = stale_while_revalidate(&ctx, &request).await;
        assert_eq!(served.response.status, 206);
        assert_eq!(ctx.cache.count_entries(&ctx.stores.runtime).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ranged_request_full_response_not_stored() {
        let url = format!("{APP}/docs/manual.pdf");
        let network = Arc::new(StubNetwork::new().with(&url, Response::with_content(200, "application/pdf", "whole")));
        let ctx = context(network).await;
        let ranged = Request::parse(&url).unwrap().with_header("range", "bytes=0-1023");

        cache_first(&ctx, &ranged).await;
        assert_eq!(ctx.cache.count_entries(&ctx.stores.precache).await.unwrap(), 0);
    }
}
