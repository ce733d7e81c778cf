//! Cache strategy router: classify, then delegate to a strategy.

use swcache_core::{AppConfig, CacheDb, Error, Request};

use crate::fetch::{Network, resolve};
use crate::offline::OfflinePolicy;
use crate::route::{Route, RouteTable, Strategy};
use crate::strategy::{self, Served, StrategyContext};
use std::sync::Arc;

/// Result of intercepting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Not handled; the host should perform its default network fetch.
    Passthrough,
    Respond { strategy: Strategy, served: Served },
}

#[derive(Clone)]
pub struct Router {
    table: RouteTable,
    ctx: StrategyContext,
}

impl Router {
    pub fn new(table: RouteTable, ctx: StrategyContext) -> Self {
        Self { table, ctx }
    }

    /// Build the standard router for a configuration.
    pub fn from_config(config: &AppConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        let shell = resolve(&origin, &config.app_shell).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let ctx = StrategyContext {
            cache,
            network,
            stores: config.store_names(),
            offline: OfflinePolicy::new(Request::get(shell)),
            refresh_on_hit: config.refresh_on_hit,
        };
        Ok(Self::new(RouteTable::standard(&origin, &config.cdn_hosts), ctx))
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    pub async fn handle(&self, request: &Request) -> Intercept {
        let strategy = match self.table.classify(request) {
            Route::Passthrough => {
                tracing::trace!(url = %request.url, method = %request.method, "passthrough");
                return Intercept::Passthrough;
            }
            Route::Handle(strategy) => strategy,
        };

        let served = match strategy {
            Strategy::CacheFirst => strategy::cache_first(&self.ctx, request).await,
            Strategy::NetworkFirst => strategy::network_first(&self.ctx, request).await,
            Strategy::StaleWhileRevalidate => strategy::stale_while_revalidate(&self.ctx, request).await,
        };

        tracing::debug!(
            url = %request.url,
            strategy = %strategy,
            source = ?served.source,
            status = served.response.status,
            "request served"
        );

        Intercept::Respond { strategy, served }
    }
}
