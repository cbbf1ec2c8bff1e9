//! The five caching strategies.
//!
//! Each strategy runs its steps in order (check cache, maybe fetch, maybe
//! write cache, return) and is otherwise independent of every other
//! in-flight request. Only GET requests with ok responses are written.

use std::sync::Arc;

use axioma_core::{CacheDb, Error, StoredResponse};

use super::{ResponseSource, Served, Worker};
use crate::fetch::{Network, ResourceRequest};
use crate::strategy::Strategy;

const OFFLINE_BODY: &str = "Offline";
const NOT_CACHED_BODY: &str = "Not found in cache";

/// Write `response` under `request` when it is cacheable.
///
/// A failed write is logged and otherwise ignored.
async fn remember(db: &CacheDb, store: &str, request: &ResourceRequest, response: &StoredResponse) {
    if !request.is_get() || !response.is_ok() {
        return;
    }
    if let Err(e) = db.put_entry(store, response).await {
        tracing::warn!(store, error = %e, "failed to cache {}", request);
    }
}

/// Fetch from the network and overwrite the cached entry when ok.
async fn fetch_and_remember(
    db: &CacheDb, network: &dyn Network, store: &str, request: &ResourceRequest,
) -> Result<StoredResponse, Error> {
    let response = network.fetch(request).await?.to_stored(request);
    remember(db, store, request, &response).await;
    Ok(response)
}

impl Worker {
    async fn cached(&self, request: &ResourceRequest) -> Result<Option<StoredResponse>, Error> {
        self.db
            .match_entry(self.cache_name(), request.method.as_str(), request.url.as_str())
            .await
    }

    /// The cached offline page from any store, else a generic 503.
    async fn offline_fallback(&self, request: &ResourceRequest, strategy: Strategy) -> Result<Served, Error> {
        let offline_url = self.resolve(&self.config.offline_page)?;
        if let Some(page) = self.db.match_any("GET", offline_url.as_str()).await? {
            return Ok(Served::new(page, ResponseSource::OfflineFallback, strategy));
        }

        let response = StoredResponse::synthetic(request.method.as_str(), request.url.as_str(), 503, OFFLINE_BODY);
        Ok(Served::new(response, ResponseSource::Generated, strategy))
    }

    pub(crate) async fn cache_first(&self, request: &ResourceRequest) -> Result<Served, Error> {
        if let Some(cached) = self.cached(request).await? {
            return Ok(Served::new(cached, ResponseSource::Cache, Strategy::CacheFirst));
        }

        match fetch_and_remember(&self.db, self.network.as_ref(), self.cache_name(), request).await {
            Ok(response) => Ok(Served::new(response, ResponseSource::Network, Strategy::CacheFirst)),
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed for {}", request);
                self.offline_fallback(request, Strategy::CacheFirst).await
            }
        }
    }

    pub(crate) async fn network_first(&self, request: &ResourceRequest) -> Result<Served, Error> {
        match fetch_and_remember(&self.db, self.network.as_ref(), self.cache_name(), request).await {
            Ok(response) => Ok(Served::new(response, ResponseSource::Network, Strategy::NetworkFirst)),
            Err(e) => {
                tracing::debug!(error = %e, "network unavailable for {}, trying cache", request);
                match self.cached(request).await? {
                    Some(cached) => Ok(Served::new(cached, ResponseSource::Cache, Strategy::NetworkFirst)),
                    None => self.offline_fallback(request, Strategy::NetworkFirst).await,
                }
            }
        }
    }

    pub(crate) async fn network_only(&self, request: &ResourceRequest) -> Result<Served, Error> {
        let response = self.network.fetch(request).await?;
        Ok(Served::new(response.to_stored(request), ResponseSource::Network, Strategy::NetworkOnly))
    }

    pub(crate) async fn cache_only(&self, request: &ResourceRequest) -> Result<Served, Error> {
        match self.cached(request).await? {
            Some(cached) => Ok(Served::new(cached, ResponseSource::Cache, Strategy::CacheOnly)),
            None => {
                let response =
                    StoredResponse::synthetic(request.method.as_str(), request.url.as_str(), 404, NOT_CACHED_BODY);
                Ok(Served::new(response, ResponseSource::Generated, Strategy::CacheOnly))
            }
        }
    }

    /// Serve the cached entry now and refresh it in the background; with
    /// nothing cached, wait for the network.
    pub(crate) async fn stale_while_revalidate(&self, request: &ResourceRequest) -> Result<Served, Error> {
        let Some(cached) = self.cached(request).await? else {
            let response = fetch_and_remember(&self.db, self.network.as_ref(), self.cache_name(), request).await?;
            return Ok(Served::new(response, ResponseSource::Network, Strategy::StaleWhileRevalidate));
        };

        let db = self.db.clone();
        let network = Arc::clone(&self.network);
        let store = self.cache_name().to_string();
        let request = request.clone();
        let revalidation = tokio::spawn(async move {
            if let Err(e) = fetch_and_remember(&db, network.as_ref(), &store, &request).await {
                tracing::debug!(error = %e, "background refresh failed for {}", request);
            }
        });

        let mut served = Served::new(cached, ResponseSource::Cache, Strategy::StaleWhileRevalidate);
        served.revalidation = Some(revalidation);
        Ok(served)
    }
}
