//! Cache inspection tools.
//!
//! This module provides read-only views of the stores; purging goes
//! through the worker's `clearCache` message.

pub mod get;
pub mod keys;

pub use get::{CacheMatchParams, match_impl};
pub use keys::{CacheKeysParams, keys_impl};
