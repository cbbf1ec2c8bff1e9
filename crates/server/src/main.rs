//! axioma-cache server entry point.
//!
//! Loads configuration, opens the cache database, installs and activates
//! the worker, then serves its tools over the MCP stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use axioma_client::{FetchClient, FetchConfig, StrategyTable, Worker, WorkerConfig, spawn_message_loop};
use axioma_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

const MESSAGE_QUEUE: usize = 32;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(cache = %config.cache_name(), origin = %config.origin, "starting axioma-cache on stdio transport");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let table = StrategyTable::from_patterns(&config.strategies)?;
    let worker = Arc::new(Worker::new(WorkerConfig::from_app_config(&config)?, table, db, Arc::new(network)));

    let report = worker.start().await?;
    if !report.failed.is_empty() {
        tracing::warn!(failed = ?report.failed, "some resources were not precached");
    }

    let (port, _messages) = spawn_message_loop(worker.clone(), MESSAGE_QUEUE);

    let handler = handler::AxiomaCacheServer::new(worker, port);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
