//! Request classification.
//!
//! Classification is an ordered list of rules evaluated top to bottom; the
//! first matching rule decides the route. The list is plain data built from
//! configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, Error, Request};
use url::{Origin, Url};

/// Caching strategy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::NetworkFirst => "network_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the host performs its default network handling.
    Passthrough,
    Handle(Strategy),
}

/// Predicate half of a routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Anything other than http/https, including browser-extension schemes.
    NonHttpScheme,
    /// Anything other than GET; only GET responses are cached.
    NonGetMethod,
    SameOrigin(Origin),
    /// Exact hostname allow-list.
    Hosts(Vec<String>),
    Any,
}

impl Matcher {
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            Matcher::NonHttpScheme => !request.is_http(),
            Matcher::NonGetMethod => !request.is_get(),
            Matcher::SameOrigin(origin) => request.url.origin() == *origin,
            Matcher::Hosts(hosts) => request
                .url
                .host_str()
                .is_some_and(|host| hosts.iter().any(|h| h.eq_ignore_ascii_case(host))),
            Matcher::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub matcher: Matcher,
    pub route: Route,
}

impl RouteRule {
    pub fn new(matcher: Matcher, route: Route) -> Self {
        Self { matcher, route }
    }
}

/// Ordered routing rules; first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The worker's routing rules:
    ///
    /// 1. non-http(s) scheme or non-GET method: passthrough
    /// 2. same origin as the app: cache-first
    /// 3. CDN/font hosts: stale-while-revalidate
    /// 4. everything else: network-first
    pub fn standard(app_origin: &Url, cdn_hosts: &[String]) -> Self {
        Self::new(vec![
            RouteRule::new(Matcher::NonHttpScheme, Route::Passthrough),
            RouteRule::new(Matcher::NonGetMethod, Route::Passthrough),
            RouteRule::new(Matcher::SameOrigin(app_origin.origin()), Route::Handle(Strategy::CacheFirst)),
            RouteRule::new(Matcher::Hosts(cdn_hosts.to_vec()), Route::Handle(Strategy::StaleWhileRevalidate)),
            RouteRule::new(Matcher::Any, Route::Handle(Strategy::NetworkFirst)),
        ])
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        Ok(Self::standard(&origin, &config.cdn_hosts))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Route for a request. A table with no matching rule passes through.
    pub fn classify(&self, request: &Request) -> Route {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(request))
            .map_or(Route::Passthrough, |rule| rule.route)
    }
}
