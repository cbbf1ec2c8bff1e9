//! Maintenance commands posted from the foreground.
//!
//! Wire shape: `{"action": "skipWaiting" | "clearCache" | "getCacheSize"}`.
//! `clearCache` replies `{"cleared": true}`, `getCacheSize` replies
//! `{"size": <bytes>}`, `skipWaiting` never replies. Each command is
//! handled to completion before the next one is read.

use std::sync::Arc;

use axioma_core::Error;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::Worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    SkipWaiting,
    ClearCache,
    GetCacheSize,
}

impl Command {
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Command::SkipWaiting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Cleared { cleared: bool },
    Size { size: u64 },
}

/// A command plus the channel its reply goes back on.
#[derive(Debug)]
pub struct Envelope {
    pub command: Command,
    pub reply: Option<oneshot::Sender<Result<Reply, Error>>>,
}

/// Sending half held by the foreground.
#[derive(Debug, Clone)]
pub struct MessagePort {
    tx: mpsc::Sender<Envelope>,
}

impl MessagePort {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Post a command and wait for its reply, if it has one.
    ///
    /// # Errors
    ///
    /// `Error::ChannelClosed` if the message loop is gone; otherwise
    /// whatever the worker returned for the command.
    pub async fn post(&self, command: Command) -> Result<Option<Reply>, Error> {
        if !command.expects_reply() {
            self.tx
                .send(Envelope { command, reply: None })
                .await
                .map_err(|_| Error::ChannelClosed)?;
            return Ok(None);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply: Some(reply_tx) })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        let reply = reply_rx.await.map_err(|_| Error::ChannelClosed)??;
        Ok(Some(reply))
    }
}

impl Worker {
    /// Execute one maintenance command.
    pub async fn handle_message(&self, command: Command) -> Result<Option<Reply>, Error> {
        match command {
            Command::SkipWaiting => {
                self.skip_waiting().await?;
                Ok(None)
            }
            Command::ClearCache => {
                let deleted = self.db.delete_stores_with_prefix(&self.config.cache_prefix).await?;
                tracing::info!(deleted, prefix = %self.config.cache_prefix, "cleared caches");
                Ok(Some(Reply::Cleared { cleared: true }))
            }
            Command::GetCacheSize => {
                let size = self.db.stores_size(&self.config.cache_prefix).await?;
                Ok(Some(Reply::Size { size }))
            }
        }
    }
}

/// Start the worker's message loop. The loop ends when every
/// `MessagePort` clone has been dropped.
pub fn spawn_message_loop(worker: Arc<Worker>, capacity: usize) -> (MessagePort, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(Envelope { command, reply }) = rx.recv().await {
            tracing::debug!(?command, "worker message");
            let result = worker.handle_message(command).await;

            match (result, reply) {
                (Ok(Some(answer)), Some(reply)) => {
                    let _ = reply.send(Ok(answer));
                }
                (Err(e), Some(reply)) => {
                    let _ = reply.send(Err(e));
                }
                (Err(e), None) => tracing::warn!(?command, error = %e, "worker message failed"),
                (Ok(_), _) => {}
            }
        }
        tracing::debug!("worker message loop stopped");
    });

    (MessagePort::new(tx), handle)
}
