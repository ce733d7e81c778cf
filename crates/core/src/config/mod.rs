//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Environment variables (SWCACHE_*, `__` for nested keys)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::StoreNames;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build version. Store names derive from it, so bumping it rotates
    /// both stores on the next activation.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix shared by every store name this worker owns.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin the app is served from. Same-origin requests are cache-first.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Path of the application shell returned to offline navigations.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,

    /// Path to the SQLite database backing the stores.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network timeout in milliseconds. Bounds every interception.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Local app-shell paths precached on install, in order.
    #[serde(default = "default_precache_assets")]
    pub precache_assets: Vec<String>,

    /// External library URLs precached on install, after local assets.
    #[serde(default = "default_external_assets")]
    pub external_assets: Vec<String>,

    /// CDN and font hosts served stale-while-revalidate.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// Refresh same-origin cache hits in the background.
    #[serde(default)]
    pub refresh_on_hit: bool,

    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Fixed metadata attached to push notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub title: String,
    #[serde(default = "default_notification_body")]
    pub body: String,
    #[serde(default = "default_notification_icon")]
    pub icon: String,
    #[serde(default = "default_notification_badge")]
    pub badge: String,
    #[serde(default = "default_notification_dir")]
    pub dir: String,
    #[serde(default = "default_notification_lang")]
    pub lang: String,
}

fn default_version() -> String {
    "v1".into()
}

fn default_cache_prefix() -> String {
    "pdf-tools".into()
}

fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

fn default_app_shell() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_precache_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "/css/styles.css",
        "/js/app.js",
        "/js/pdf-tools.js",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_external_assets() -> Vec<String> {
    [
        "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js",
        "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js",
        "https://unpkg.com/pdf-lib@1.17.1/dist/pdf-lib.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_cdn_hosts() -> Vec<String> {
    ["cdnjs.cloudflare.com", "unpkg.com", "cdn.jsdelivr.net", "fonts.googleapis.com", "fonts.gstatic.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_notification_title() -> String {
    "PDF Tools".into()
}

fn default_notification_body() -> String {
    "You have a new update".into()
}

fn default_notification_icon() -> String {
    "/icons/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/icons/badge-72x72.png".into()
}

fn default_notification_dir() -> String {
    "ltr".into()
}

fn default_notification_lang() -> String {
    "en-US".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_badge(),
            dir: default_notification_dir(),
            lang: default_notification_lang(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            app_origin: default_app_origin(),
            app_shell: default_app_shell(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            precache_assets: default_precache_assets(),
            external_assets: default_external_assets(),
            cdn_hosts: default_cdn_hosts(),
            refresh_on_hit: false,
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Store names for the configured prefix and version.
    pub fn store_names(&self) -> StoreNames {
        StoreNames::for_version(&self.cache_prefix, &self.version)
    }

    /// Parsed app origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `app_origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.app_origin)
            .map_err(|e| ConfigError::Invalid { field: "app_origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack used by [`AppConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
