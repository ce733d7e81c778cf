//! Push payloads and the notifications built from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::NotificationConfig;
use url::Url;

use crate::fetch::resolve;

/// The three fields read from a push payload. Everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    /// Missing or malformed payloads parse as empty.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "push payload is not JSON; using defaults");
            Self::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub dir: String,
    pub lang: String,
    pub data: NotificationData,
}

pub fn build(defaults: &NotificationConfig, origin: &Url, payload: PushPayload) -> Notification {
    Notification {
        title: payload.title.unwrap_or_else(|| defaults.title.clone()),
        body: payload.body.unwrap_or_else(|| defaults.body.clone()),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        dir: defaults.dir.clone(),
        lang: defaults.lang.clone(),
        data: NotificationData { url: click_target(origin, payload.url.as_deref()) },
    }
}

/// Absolute URL to open when a notification is clicked. Falls back to the
/// app root when the target is missing or unusable.
pub fn click_target(origin: &Url, url: Option<&str>) -> String {
    let root = || origin.join("/").map_or_else(|_| origin.to_string(), |u| u.to_string());
    match url.map(|u| resolve(origin, u)) {
        Some(Ok(target)) => target.to_string(),
        Some(Err(e)) => {
            tracing::debug!(error = %e, "unusable notification url; opening app root");
            root()
        }
        None => root(),
    }
}
