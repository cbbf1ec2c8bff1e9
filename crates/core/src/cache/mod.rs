//! SQLite-backed versioned cache stores.
//!
//! This module provides the persistent equivalent of a browser's cache
//! storage: any number of named stores, each a key-value map from request
//! identity to captured response. It supports:
//!
//! - Request keys derived from method and URL using SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Store-level purge by exact name or by naming prefix

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
