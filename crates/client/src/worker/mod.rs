//! The caching worker: lifecycle, fetch interception and maintenance.
//!
//! ### Lifecycle
//! `parsed → installing → installed → activating → activated`. Install
//! precaches the manifest into the versioned store; activate purges every
//! other store of the same family and claims open clients.
//!
//! ### Interception
//! Only same-origin requests reaching an activated worker are handled.
//! Everything else passes through untouched.
//!
//! ### Surfaces
//! - `messages`: skipWaiting / clearCache / getCacheSize over a channel
//! - `push`: notifications and clicks
//! - `sync`: background refresh of critical resources

pub mod clients;
pub mod lifecycle;
pub mod messages;
pub mod push;
pub mod strategies;
pub mod sync;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axioma_core::{AppConfig, CacheDb, Error, NotificationConfig, StoredResponse};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::{Network, ResourceRequest, canonicalize, same_origin};
use crate::strategy::{Strategy, StrategyTable};

pub use clients::{ClientInfo, ClientRegistry};
pub use lifecycle::RefreshReport;
pub use messages::{Command, Envelope, MessagePort, Reply, spawn_message_loop};
pub use push::{Notification, NotificationCenter, NotificationData};
pub use sync::UPDATE_CACHE_TAG;

/// Immutable settings the worker runs with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub cache_prefix: String,
    pub cache_name: String,
    pub offline_page: String,
    pub precache: Vec<String>,
    pub critical_resources: Vec<String>,
    pub notification: NotificationConfig,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::Config(format!("origin: {e}")))?;
        if origin.host_str().is_none() {
            return Err(Error::Config(format!("origin has no host: {origin}")));
        }

        Ok(Self {
            origin,
            cache_prefix: config.cache_prefix.clone(),
            cache_name: config.cache_name(),
            offline_page: config.offline_page.clone(),
            precache: config.precache.clone(),
            critical_resources: config.critical_resources.clone(),
            notification: config.notification.clone(),
        })
    }
}

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, install not yet started
    Parsed,
    Installing,
    /// Precache done, waiting to activate
    Installed,
    Activating,
    /// Controlling clients and intercepting fetches
    Activated,
    /// Install failed; the worker will never activate
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The cached offline page, served because the network failed
    OfflineFallback,
    /// Built locally: the generic offline answer or a cache-only miss
    Generated,
    /// Not intercepted; fetched as if no worker existed
    Passthrough,
}

/// A response produced for an intercepted request.
#[derive(Debug)]
pub struct Served {
    pub response: StoredResponse,
    pub source: ResponseSource,
    pub strategy: Option<Strategy>,
    /// Background refresh started by stale-while-revalidate. Dropping
    /// the handle detaches the task; it still runs to completion.
    pub revalidation: Option<JoinHandle<()>>,
}

impl Served {
    pub(crate) fn new(response: StoredResponse, source: ResponseSource, strategy: Strategy) -> Self {
        Self { response, source, strategy: Some(strategy), revalidation: None }
    }
}

/// The caching worker.
pub struct Worker {
    config: WorkerConfig,
    table: StrategyTable,
    db: CacheDb,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    clients: ClientRegistry,
    notifications: NotificationCenter,
}

impl Worker {
    pub fn new(config: WorkerConfig, table: StrategyTable, db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self {
            config,
            table,
            db,
            network,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients: ClientRegistry::new(),
            notifications: NotificationCenter::new(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Name of the store this worker version owns.
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn strategy_for(&self, url: &Url) -> Strategy {
        self.table.classify(url.as_str())
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        let previous = *state;
        if previous != next {
            tracing::info!(from = %previous, to = %next, cache = %self.config.cache_name, "worker state change");
            *state = next;
        }
    }

    /// Move from `from` to `to` under one write guard. On mismatch the
    /// state is left alone and returned as the error.
    pub(crate) async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), WorkerState> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(*state);
        }
        tracing::info!(from = %from, to = %to, cache = %self.config.cache_name, "worker state change");
        *state = to;
        Ok(())
    }

    /// Resolve a root-relative path or absolute URL into a canonical URL.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        canonicalize(&self.config.origin, input).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Intercept a request.
    ///
    /// Returns `Ok(None)` when the request is not ours to handle: it is
    /// cross-origin, or the worker is not activated yet.
    pub async fn handle_fetch(&self, request: &ResourceRequest) -> Result<Option<Served>, Error> {
        if !same_origin(&request.url, &self.config.origin) {
            tracing::trace!("pass-through cross-origin {}", request);
            return Ok(None);
        }

        let state = self.state().await;
        if !state.can_intercept_fetch() {
            tracing::trace!(%state, "pass-through {} before activation", request);
            return Ok(None);
        }

        // fragments never reach the network and never take part in matching
        let mut request = request.clone();
        request.url.set_fragment(None);
        let request = &request;

        let strategy = self.strategy_for(&request.url);
        tracing::debug!(%strategy, "intercept {}", request);

        let served = match strategy {
            Strategy::CacheFirst => self.cache_first(request).await?,
            Strategy::NetworkFirst => self.network_first(request).await?,
            Strategy::NetworkOnly => self.network_only(request).await?,
            Strategy::CacheOnly => self.cache_only(request).await?,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
        };

        Ok(Some(served))
    }

    /// Default handling for requests the worker does not intercept.
    pub async fn passthrough(&self, request: &ResourceRequest) -> Result<Served, Error> {
        let response = self.network.fetch(request).await?;
        Ok(Served {
            response: response.to_stored(request),
            source: ResponseSource::Passthrough,
            strategy: None,
            revalidation: None,
        })
    }

    /// `handle_fetch`, falling back to `passthrough` when not intercepted.
    pub async fn fetch(&self, request: &ResourceRequest) -> Result<Served, Error> {
        match self.handle_fetch(request).await? {
            Some(served) => Ok(served),
            None => self.passthrough(request).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::testing::MockNetwork;

    #[test]
    fn test_worker_config_from_app_config() {
        let config = WorkerConfig::from_app_config(&app_config()).unwrap();
        assert_eq!(config.cache_name, "axioma-capital-v1.0.0");
        assert_eq!(config.cache_prefix, "axioma-capital");
        assert_eq!(config.origin.as_str(), "https://axioma.example/");
    }

    #[test]
    fn test_worker_config_rejects_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(WorkerConfig::from_app_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert!(WorkerState::Activated.can_intercept_fetch());
        assert!(!WorkerState::Installed.can_intercept_fetch());
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        let request = ResourceRequest::get(Url::parse("https://cdn.example/lib.js").unwrap());

        assert!(worker.handle_fetch(&request).await.unwrap().is_none());
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_intercepted_before_activation() {
        let network = Arc::new(MockNetwork::new());
        let worker = worker_with(&app_config(), network.clone()).await;
        let request = ResourceRequest::get(worker.resolve("/css/main.css").unwrap());

        assert!(worker.handle_fetch(&request).await.unwrap().is_none());
        assert!(!worker.db().has_store(worker.cache_name()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fragment_is_ignored_when_matching() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        network.respond(&url("/api/contact"), 200, "contact");
        let plain = ResourceRequest::get(Url::parse(&url("/api/contact")).unwrap());
        worker.handle_fetch(&plain).await.unwrap();
        network.set_offline(true);

        let with_fragment = ResourceRequest::get(Url::parse(&url("/api/contact#form")).unwrap());
        let served = worker.handle_fetch(&with_fragment).await.unwrap().unwrap();

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.status, 200);
        assert_eq!(served.response.body, b"contact");
    }

    #[tokio::test]
    async fn test_fragment_is_not_part_of_the_cache_key() {
        let network = Arc::new(MockNetwork::new());
        network.respond(&url("/fonts/inter.woff2"), 200, "font");
        let worker = active_worker(network.clone()).await;

        let request = ResourceRequest::get(Url::parse(&url("/fonts/inter.woff2#v2")).unwrap());
        worker.handle_fetch(&request).await.unwrap();

        assert_eq!(network.calls(), vec![format!("GET {}", url("/fonts/inter.woff2"))]);
        let stored = worker.db().match_entry(worker.cache_name(), "GET", &url("/fonts/inter.woff2")).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_passthrough() {
        let network = Arc::new(MockNetwork::new());
        network.respond("https://cdn.example/lib.js", 200, "lib");
        let worker = active_worker(network.clone()).await;
        let request = ResourceRequest::get(Url::parse("https://cdn.example/lib.js").unwrap());

        let served = worker.fetch(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
        assert_eq!(served.response.body, b"lib");
        assert!(worker.db().match_any("GET", "https://cdn.example/lib.js").await.unwrap().is_none());
    }
}
