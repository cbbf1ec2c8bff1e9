//! Install and activate.
//!
//! Install opens the versioned store and precaches the manifest, one
//! independent fetch per resource: a failed resource is logged and
//! skipped, never fatal. Activate deletes every other store of the same
//! family, waits for all deletions, then claims open clients.

use std::sync::atomic::Ordering;

use axioma_core::Error;
use axioma_core::cache::stores::has_prefix;
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};

use super::{Worker, WorkerState};
use crate::fetch::ResourceRequest;

/// Outcome of refreshing a list of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Paths now cached with a fresh response.
    pub stored: Vec<String>,
    /// Paths whose fetch failed or returned a non-ok status.
    pub failed: Vec<String>,
}

impl Worker {
    /// Fetch every path concurrently and store the ok responses.
    pub(crate) async fn refresh_all(&self, paths: &[String]) -> RefreshReport {
        let results = join_all(paths.iter().map(|path| self.refresh_one(path))).await;

        let mut report = RefreshReport::default();
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(()) => report.stored.push(path.clone()),
                Err(e) => {
                    tracing::warn!(resource = %path, error = %e, "failed to cache resource");
                    report.failed.push(path.clone());
                }
            }
        }
        report
    }

    async fn refresh_one(&self, path: &str) -> Result<(), Error> {
        let request = ResourceRequest::get(self.resolve(path)?);
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::Network(format!("status {}", response.status.as_u16())));
        }
        self.db.put_entry(self.cache_name(), &response.to_stored(&request)).await
    }

    /// Run the install phase.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerState` unless the worker is freshly parsed, or
    /// the store error if the versioned store cannot be created (the
    /// worker is then redundant). Individual manifest failures are only
    /// reported.
    pub async fn install(&self) -> Result<RefreshReport, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)
            .await
            .map_err(|state| Error::WorkerState(format!("cannot install from {state}")))?;
        self.skip_waiting.store(true, Ordering::SeqCst);

        if let Err(e) = self.db.open_store(self.cache_name()).await {
            tracing::error!(error = %e, cache = %self.cache_name(), "install failed");
            self.set_state(WorkerState::Redundant).await;
            return Err(e);
        }

        let report = self.refresh_all(&self.config.precache).await;
        tracing::info!(
            cache = %self.cache_name(),
            stored = report.stored.len(),
            failed = report.failed.len(),
            "precache complete"
        );

        self.set_state(WorkerState::Installed).await;
        Ok(report)
    }

    /// Run the activate phase and return the names of deleted stores.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerState` unless installed. If a stale store
    /// cannot be deleted the worker stays installed and the error is
    /// returned; activation can be retried.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await
            .map_err(|state| Error::WorkerState(format!("cannot activate from {state}")))?;
        self.finish_activation().await
    }

    /// Activation steps after the worker has entered `Activating`.
    async fn finish_activation(&self) -> Result<Vec<String>, Error> {
        let stale = match self.stale_stores().await {
            Ok(stale) => stale,
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                return Err(e);
            }
        };

        for name in &stale {
            tracing::info!(store = %name, "deleting old cache");
        }
        if let Err(e) = try_join_all(stale.iter().map(|name| self.db.delete_store(name))).await {
            tracing::error!(error = %e, "failed to delete old caches");
            self.set_state(WorkerState::Installed).await;
            return Err(e);
        }

        let claimed = self.clients.claim().await;
        tracing::debug!(claimed, "claimed clients");

        self.set_state(WorkerState::Activated).await;
        Ok(stale)
    }

    async fn stale_stores(&self) -> Result<Vec<String>, Error> {
        let names = self.db.store_names().await?;
        Ok(names
            .into_iter()
            .filter(|name| has_prefix(name, &self.config.cache_prefix) && name != self.cache_name())
            .collect())
    }

    /// Install, then activate right away when skip-waiting was requested.
    pub async fn start(&self) -> Result<RefreshReport, Error> {
        let report = self.install().await?;
        if self.skip_waiting_requested() {
            self.activate().await?;
        }
        Ok(report)
    }

    /// Request immediate activation. An installed worker activates now;
    /// in any other state the request is only recorded.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.transition(WorkerState::Installed, WorkerState::Activating).await.is_ok() {
            self.finish_activation().await?;
        }
        Ok(())
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}
