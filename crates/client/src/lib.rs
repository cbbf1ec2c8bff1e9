//! Client side of axioma-cache.
//!
//! This crate provides the network fetch pipeline, the strategy table and
//! the caching worker built on top of the stores in `axioma-core`.

pub mod fetch;
pub mod strategy;
pub mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Network, ResourceRequest};
pub use strategy::{Strategy, StrategyTable};
pub use worker::{
    Command, MessagePort, Notification, RefreshReport, Reply, ResponseSource, Served, Worker, WorkerConfig,
    WorkerState, spawn_message_loop,
};
