//! cache_get tool implementation.
//!
//! Looks a request up in the current stores without going through the
//! worker, so no strategy runs and nothing is refreshed.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WorkerContext;
use swcache_core::{Error, Request};

use crate::tools::fetch::ResponseView;
use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the cached request.
    pub url: String,

    /// Request method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    /// Hex cache key of `METHOD\nURL`.
    pub key: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub response: ResponseView,
}

pub async fn get_impl(ctx: &WorkerContext, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let mut request = Request::parse(&params.url)?;
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method);
    }

    for store in ctx.stores.all() {
        if let Some(entry) = ctx.cache.get_entry(store, &request).await? {
            let output = CacheGetOutput {
                response: ResponseView::from(&entry.response),
                store: entry.store,
                key: entry.key,
                method: entry.method,
                url: entry.url,
                stored_at: entry.stored_at,
            };
            return json_result(&output);
        }
    }

    Err(Error::CacheMiss(format!("{} {}", request.method, request.cache_url())).into())
}
