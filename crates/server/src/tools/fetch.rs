//! sw_fetch tool implementation.
//!
//! Delivers a fetch event to the worker. Requests the worker passes through
//! are fetched directly over the network when they are http(s), which is
//! what a host does when no handler responds.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Intercept, ResponseSource, Strategy, Worker};
use swcache_core::{Destination, Request, RequestMode, Response};

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute request URL.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are intercepted.
    #[serde(default)]
    pub method: Option<String>,

    /// Resource type: document, image, script, style, font, or other.
    #[serde(default)]
    pub destination: Option<String>,

    /// Request mode: navigate, same-origin, cors, or no-cors.
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SwFetchParams {
    fn into_request(self) -> Result<Request, swcache_core::Error> {
        let mut request = Request::parse(&self.url)?;
        if let Some(method) = self.method.as_deref() {
            request = request.with_method(method);
        }
        if let Some(destination) = self.destination.as_deref() {
            request = request.with_destination(Destination::from(destination));
        }
        if let Some(mode) = self.mode.as_deref() {
            request = request.with_mode(RequestMode::from(mode));
        }
        for (name, value) in &self.headers {
            request = request.with_header(name, value);
        }
        Ok(request)
    }
}

/// A response rendered for tool output. Bodies are decoded lossily as UTF-8.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: String,
    pub body_bytes: usize,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            content_type: response.content_type().map(str::to_string),
            body: response.body_text().into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    /// Whether the worker handled the request.
    pub intercepted: bool,
    pub strategy: Option<Strategy>,
    pub source: Option<ResponseSource>,
    /// Absent for passthrough requests the host cannot fetch.
    pub response: Option<ResponseView>,
}

pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = params.into_request()?;
    let url = request.url.to_string();
    let method = request.method.clone();

    let output = match worker.fetch(request.clone()).await {
        Intercept::Respond { strategy, served } => SwFetchOutput {
            url,
            method,
            intercepted: true,
            strategy: Some(strategy),
            source: Some(served.source),
            response: Some(ResponseView::from(&served.response)),
        },
        Intercept::Passthrough => {
            let response = if request.is_http() {
                let response = worker.context().network.fetch(&request).await?;
                Some(ResponseView::from(&response))
            } else {
                tracing::debug!(url = %url, "passthrough for non-http scheme; nothing to fetch");
                None
            };
            SwFetchOutput { url, method, intercepted: false, strategy: None, source: None, response }
        }
    };

    json_result(&output)
}
