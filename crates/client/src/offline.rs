//! Synthetic responses for when neither cache nor network can answer.

use swcache_core::{CacheDb, Destination, Request, Response, StoreNames};

/// Inline image returned for image requests while offline.
pub const OFFLINE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200"><rect width="200" height="200" fill="#f3f4f6"/><text x="100" y="105" text-anchor="middle" font-family="sans-serif" font-size="20" fill="#6b7280">Offline</text></svg>"##;

pub const OFFLINE_SCRIPT: &str = "// offline\n";

pub const OFFLINE_STYLE: &str = "/* offline */\n";

pub const UNAVAILABLE_BODY: &str = "Service Unavailable";

/// Which placeholder a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// The cached application shell.
    Document,
    Image,
    Script,
    Style,
    /// Fixed 503.
    Unavailable,
}

impl PlaceholderKind {
    pub fn for_request(request: &Request) -> Self {
        if request.wants_document() {
            return PlaceholderKind::Document;
        }
        match request.destination {
            Destination::Image => PlaceholderKind::Image,
            Destination::Script => PlaceholderKind::Script,
            Destination::Style => PlaceholderKind::Style,
            Destination::Document => PlaceholderKind::Document,
            Destination::Font | Destination::Other => PlaceholderKind::Unavailable,
        }
    }
}

/// The fixed 503 response.
pub fn unavailable() -> Response {
    Response::with_content(503, "text/plain; charset=utf-8", UNAVAILABLE_BODY).with_header("cache-control", "no-store")
}

/// Static placeholder for a kind. Documents get the 503 here because the
/// shell has to come from a store; see [`OfflinePolicy::respond`].
pub fn placeholder(kind: PlaceholderKind) -> Response {
    match kind {
        PlaceholderKind::Image => Response::with_content(200, "image/svg+xml", OFFLINE_SVG),
        PlaceholderKind::Script => Response::with_content(200, "application/javascript; charset=utf-8", OFFLINE_SCRIPT),
        PlaceholderKind::Style => Response::with_content(200, "text/css; charset=utf-8", OFFLINE_STYLE),
        PlaceholderKind::Document | PlaceholderKind::Unavailable => unavailable(),
    }
}

/// Offline fallback keyed by resource kind.
#[derive(Debug, Clone)]
pub struct OfflinePolicy {
    app_shell: Request,
}

impl OfflinePolicy {
    /// `app_shell` is the request under which the shell page is cached.
    pub fn new(app_shell: Request) -> Self {
        Self { app_shell }
    }

    pub fn app_shell(&self) -> &Request {
        &self.app_shell
    }

    /// Best-effort offline response. Never fails: a cache error while
    /// looking up the shell degrades to the 503.
    pub async fn respond(&self, cache: &CacheDb, stores: &StoreNames, request: &Request) -> Response {
        let kind = PlaceholderKind::for_request(request);
        if kind != PlaceholderKind::Document {
            return placeholder(kind);
        }

        match cache.match_in(&stores.all(), &self.app_shell).await {
            Ok(Some(shell)) => shell,
            Ok(None) => {
                tracing::debug!(url = %request.url, "app shell not cached; serving 503");
                unavailable()
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "app shell lookup failed");
                unavailable()
            }
        }
    }
}
