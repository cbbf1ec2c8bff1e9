//! Core types and shared functionality for axioma-cache.
//!
//! This crate provides:
//! - Versioned cache stores with a SQLite backend
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, StoredResponse};
pub use config::{AppConfig, ConfigError, NotificationConfig, StrategyPatterns};
pub use error::Error;
