//! cache_list tool implementation.
//!
//! Lists every store in the database, including stale ones an activate
//! would delete.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WorkerContext;

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    /// Whether the store belongs to the running version.
    pub current: bool,
    pub entries: u64,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub version: String,
    pub stores: Vec<StoreSummary>,
}

pub async fn list_impl(ctx: &WorkerContext) -> Result<CallToolResult, McpError> {
    let mut stores = Vec::new();
    for name in ctx.cache.store_names().await? {
        let entries = ctx.cache.count_entries(&name).await?;
        let urls = ctx.cache.entry_urls(&name).await?;
        stores.push(StoreSummary { current: ctx.stores.contains(&name), name, entries, urls });
    }

    json_result(&CacheListOutput { version: ctx.version.clone(), stores })
}
