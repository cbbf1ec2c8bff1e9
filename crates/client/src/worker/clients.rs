//! Open client contexts (pages/windows) the worker can control.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: u64,
    pub url: String,
    /// Whether this worker controls the client's requests.
    pub controlled: bool,
}

/// Registry of open clients.
///
/// A client stays listed until its page reports itself closed through
/// `close_client`; the worker never drops clients on its own.
#[derive(Debug)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: RwLock<Vec<ClientInfo>>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), clients: RwLock::new(Vec::new()) }
    }

    /// Track a client that was opened without this worker in control.
    pub async fn register(&self, url: &str) -> ClientInfo {
        self.insert(url, false).await
    }

    /// Take control of every open client. Returns how many changed hands.
    pub async fn claim(&self) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for client in clients.iter_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    /// Focus an open client at `url`, or open a new controlled one.
    pub async fn open_window(&self, url: &str) -> ClientInfo {
        if let Some(existing) = self.clients.read().await.iter().find(|c| c.url == url) {
            tracing::debug!(client = existing.id, "focusing client at {}", url);
            return existing.clone();
        }
        tracing::debug!("opening window at {}", url);
        self.insert(url, true).await
    }

    /// Forget a client whose page went away. Returns it if it was listed.
    pub async fn close_client(&self, id: u64) -> Option<ClientInfo> {
        let mut clients = self.clients.write().await;
        let index = clients.iter().position(|c| c.id == id)?;
        tracing::debug!(client = id, "client closed");
        Some(clients.remove(index))
    }

    pub async fn list(&self) -> Vec<ClientInfo> {
        self.clients.read().await.clone()
    }

    async fn insert(&self, url: &str, controlled: bool) -> ClientInfo {
        let client = ClientInfo { id: self.next_id.fetch_add(1, Ordering::SeqCst), url: url.to_string(), controlled };
        self.clients.write().await.push(client.clone());
        client
    }
}
