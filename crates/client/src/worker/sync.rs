//! Background sync.

use axioma_core::Error;

use super::{RefreshReport, Worker, WorkerState};

/// Tag that refreshes the critical resources.
pub const UPDATE_CACHE_TAG: &str = "update-cache";

impl Worker {
    /// Handle a sync event. Unknown tags are ignored (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// `Error::WorkerState` unless the worker is activated.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<RefreshReport>, Error> {
        let state = self.state().await;
        if state != WorkerState::Activated {
            return Err(Error::WorkerState(format!("cannot sync while {state}")));
        }

        if tag != UPDATE_CACHE_TAG {
            tracing::debug!(tag, "ignoring sync tag");
            return Ok(None);
        }

        let report = self.refresh_all(&self.config.critical_resources).await;
        tracing::info!(stored = report.stored.len(), failed = report.failed.len(), "cache updated");
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::*;
    use super::*;
    use crate::testing::MockNetwork;

    #[tokio::test]
    async fn test_update_cache_refreshes_critical_resources() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        network.respond(&url("/"), 200, "new home");
        network.respond(&url("/css/main.css"), 200, "new css");
        network.fail(&url("/js/main.js"));

        let report = worker.handle_sync(UPDATE_CACHE_TAG).await.unwrap().unwrap();
        assert_eq!(report.stored, vec!["/", "/css/main.css"]);
        assert_eq!(report.failed, vec!["/js/main.js"]);

        let home = worker.db().match_entry(worker.cache_name(), "GET", &url("/")).await.unwrap().unwrap();
        assert_eq!(home.body, b"new home");
        let js = worker.db().match_entry(worker.cache_name(), "GET", &url("/js/main.js")).await.unwrap().unwrap();
        assert_eq!(js.body, b"precached /js/main.js");
        assert_eq!(network.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_ignored() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;

        assert!(worker.handle_sync("send-form").await.unwrap().is_none());
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_requires_activation() {
        let worker = worker_with(&app_config(), Arc::new(MockNetwork::new())).await;
        assert!(matches!(worker.handle_sync(UPDATE_CACHE_TAG).await, Err(Error::WorkerState(_))));
    }
}
