//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (AXIOMA_CACHE_*)
//! 2. TOML config file (if AXIOMA_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Everything here is read once at startup and handed to the worker as
//! immutable settings.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Resources precached when the worker installs.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/css/main.css",
    "/js/main.js",
    "/js/config/config.js",
    "/js/core/App.js",
    "/js/modules/VideoManager.js",
    "/js/modules/NavigationManager.js",
    "/js/modules/FormManager.js",
    "/js/modules/LoadingManager.js",
    "/js/modules/LazyLoadManager.js",
    "/js/modules/ScrollAnimationManager.js",
    "/js/modules/LicenseModal.js",
    "/js/utils/utils.js",
    "/assets/hero-poster.jpg",
    "/assets/about-mobile.png",
    "/assets/about-desktop.jpg",
    "/assets/4logo.png",
];

/// Resources refreshed by the `update-cache` background sync.
pub const DEFAULT_CRITICAL_RESOURCES: &[&str] = &["/", "/css/main.css", "/js/main.js"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (AXIOMA_CACHE_*)
/// 2. TOML config file (if AXIOMA_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin whose requests the worker intercepts, e.g. `https://axioma.example`.
    ///
    /// Set via AXIOMA_CACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Naming prefix shared by every store this worker owns.
    ///
    /// Set via AXIOMA_CACHE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version string embedded in the active store name. Bumping it
    /// invalidates every previously cached entry on the next activation.
    ///
    /// Set via AXIOMA_CACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via AXIOMA_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via AXIOMA_CACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via AXIOMA_CACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via AXIOMA_CACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Root-relative path of the offline fallback page.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Root-relative paths precached on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Root-relative paths refreshed by the `update-cache` sync tag.
    #[serde(default = "default_critical_resources")]
    pub critical_resources: Vec<String>,

    /// URL patterns per strategy group.
    #[serde(default)]
    pub strategies: StrategyPatterns,

    /// Presentation of push notifications.
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Regex patterns for each strategy group.
///
/// Groups are always evaluated in field order, whatever order they
/// appear in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPatterns {
    #[serde(default = "default_cache_first")]
    pub cache_first: Vec<String>,
    #[serde(default = "default_network_first")]
    pub network_first: Vec<String>,
    #[serde(default = "default_network_only")]
    pub network_only: Vec<String>,
    #[serde(default = "default_cache_only")]
    pub cache_only: Vec<String>,
    #[serde(default = "default_stale_while_revalidate")]
    pub stale_while_revalidate: Vec<String>,
}

impl Default for StrategyPatterns {
    fn default() -> Self {
        Self {
            cache_first: default_cache_first(),
            network_first: default_network_first(),
            network_only: default_network_only(),
            cache_only: default_cache_only(),
            stale_while_revalidate: default_stale_while_revalidate(),
        }
    }
}

/// Notification presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub title: String,
    /// Body used when a push arrives without a payload.
    #[serde(default = "default_notification_body")]
    pub default_body: String,
    #[serde(default = "default_notification_icon")]
    pub icon: String,
    #[serde(default = "default_notification_badge")]
    pub badge: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            default_body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_badge(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_prefix() -> String {
    "axioma-capital".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./axioma-cache.sqlite")
}

fn default_user_agent() -> String {
    "axioma-cache/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_precache() -> Vec<String> {
    strings(DEFAULT_PRECACHE)
}

fn default_critical_resources() -> Vec<String> {
    strings(DEFAULT_CRITICAL_RESOURCES)
}

fn default_cache_first() -> Vec<String> {
    strings(&[r"\.css$", r"\.js$", r"\.woff2?$", r"\.ttf$", r"\.otf$", r"\.eot$"])
}

fn default_network_first() -> Vec<String> {
    strings(&[r"/api/", r"\.json$"])
}

fn default_network_only() -> Vec<String> {
    strings(&[r"/auth/", r"/payment/"])
}

fn default_cache_only() -> Vec<String> {
    strings(&[r"offline\.html$"])
}

fn default_stale_while_revalidate() -> Vec<String> {
    strings(&[r"\.jpg$", r"\.jpeg$", r"\.png$", r"\.gif$", r"\.svg$", r"\.webp$"])
}

fn default_notification_title() -> String {
    "Axioma Capital".into()
}

fn default_notification_body() -> String {
    "New notification".into()
}

fn default_notification_icon() -> String {
    "/icon-192.png".into()
}

fn default_notification_badge() -> String {
    "/badge-72.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            offline_page: default_offline_page(),
            precache: default_precache(),
            critical_resources: default_critical_resources(),
            strategies: StrategyPatterns::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the store owned by this version: `<prefix>-<version>`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `AXIOMA_CACHE_`
    /// 2. TOML file from `AXIOMA_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// Nested keys use `__`, e.g. `AXIOMA_CACHE_NOTIFICATION__TITLE`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("AXIOMA_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("AXIOMA_CACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
