//! Install and activate: precaching and version rotation.

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, Error, Request};
use url::Url;

use super::WorkerContext;
use crate::fetch::resolve;
use crate::strategy::storable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub store: String,
    pub cached: usize,
    /// URLs that failed, answered non-2xx, or answered with partial content.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
}

/// Outcome of fetching a batch of URLs into one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BatchResult {
    pub(crate) cached: usize,
    pub(crate) skipped: Vec<String>,
}

/// Absolute URLs precached on install: local assets first, then external
/// libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    urls: Vec<Url>,
}

impl AssetManifest {
    pub fn new(urls: Vec<Url>) -> Self {
        Self { urls }
    }

    pub fn from_config(config: &AppConfig, origin: &Url) -> Result<Self, Error> {
        let urls = config
            .precache_assets
            .iter()
            .chain(config.external_assets.iter())
            .map(|asset| resolve(origin, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(urls))
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Fetch every URL concurrently and store the complete 2xx responses in
/// `store`, in the order given. Failures are logged and skipped.
pub(crate) async fn cache_all(ctx: &WorkerContext, store: &str, urls: &[Url]) -> Result<BatchResult, Error> {
    ctx.cache.open_store(store).await?;

    let requests: Vec<Request> = urls.iter().cloned().map(Request::get).collect();
    let responses = join_all(requests.iter().map(|request| ctx.network.fetch(request))).await;

    let mut result = BatchResult::default();
    for (request, response) in requests.iter().zip(responses) {
        match response {
            Ok(response) if storable(request, &response) => {
                ctx.cache.put_entry(store, request, &response).await?;
                result.cached += 1;
            }
            Ok(response) => {
                tracing::warn!(
                    url = %request.url,
                    status = response.status,
                    "asset not cached: incomplete or non-success response"
                );
                result.skipped.push(request.url.to_string());
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "asset not cached: fetch failed");
                result.skipped.push(request.url.to_string());
            }
        }
    }
    Ok(result)
}

/// Result of a skip-waiting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipWaiting {
    /// The worker was waiting and is now active.
    Activated,
    /// Install is still running; activation follows as soon as it ends.
    Deferred,
    /// Nothing to skip.
    NotWaiting,
}

/// Precache the manifest into the current precache store.
///
/// Ends `Installed`, or `Activated` when a skip-waiting request arrived
/// while the install was running.
pub async fn install(ctx: &WorkerContext) -> Result<InstallReport, Error> {
    ctx.set_state(LifecycleState::Installing).await;
    let store = ctx.stores.precache.clone();
    if ctx.manifest.is_empty() {
        tracing::debug!(store = %store, "empty asset manifest");
    }

    let result = match cache_all(ctx, &store, ctx.manifest.urls()).await {
        Ok(result) => result,
        Err(e) => {
            ctx.abort_install().await;
            return Err(e);
        }
    };

    tracing::info!(
        store = %store,
        assets = ctx.manifest.len(),
        cached = result.cached,
        skipped = result.skipped.len(),
        "install complete"
    );
    if ctx.finish_install().await {
        tracing::info!("skip-waiting requested during install; activating");
        activate(ctx).await?;
    }
    Ok(InstallReport { store, cached: result.cached, skipped: result.skipped })
}

/// Delete every store that is not current, then make sure both current
/// stores exist. On error the previous state is restored.
pub async fn activate(ctx: &WorkerContext) -> Result<ActivateReport, Error> {
    let previous = ctx.state().await;
    ctx.set_state(LifecycleState::Activating).await;

    match rotate_stores(ctx).await {
        Ok(deleted) => {
            ctx.set_state(LifecycleState::Activated).await;
            let kept = ctx.stores.all().iter().map(|s| s.to_string()).collect();
            Ok(ActivateReport { kept, deleted })
        }
        Err(e) => {
            ctx.set_state(previous).await;
            Err(e)
        }
    }
}

async fn rotate_stores(ctx: &WorkerContext) -> Result<Vec<String>, Error> {
    let mut deleted = Vec::new();
    for name in ctx.cache.store_names().await? {
        if !ctx.stores.contains(&name) && ctx.cache.delete_store(&name).await? {
            tracing::info!(store = %name, "deleted stale store");
            deleted.push(name);
        }
    }

    for name in ctx.stores.all() {
        ctx.cache.open_store(name).await?;
    }
    Ok(deleted)
}

/// Activate now if installed and waiting. A request that arrives during
/// install is remembered and honoured when the install finishes.
pub async fn skip_waiting(ctx: &WorkerContext) -> Result<SkipWaiting, Error> {
    match ctx.request_skip_waiting().await {
        LifecycleState::Installing => Ok(SkipWaiting::Deferred),
        LifecycleState::Installed => {
            activate(ctx).await?;
            Ok(SkipWaiting::Activated)
        }
        _ => Ok(SkipWaiting::NotWaiting),
    }
}
