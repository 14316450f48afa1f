// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared key-value store contract
//!
//! The semaphore protocol only relies on the primitives listed here: list
//! push/pop (including a suspending pop), hash field operations, scalar
//! set-if-absent and read-and-replace, guarded transactional batches, per-key
//! TTL and the server clock.

mod batch;
mod memory;

pub use batch::{Batch, BatchGuard, Command, Reply};
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for the shared key-value store
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// Pop the head of a list without waiting
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Pop the head of a list, suspending until an element arrives.
    ///
    /// `None` waits indefinitely; otherwise gives up after `timeout`.
    async fn blpop(&self, key: &str, timeout: Option<Duration>)
        -> Result<Option<String>, StoreError>;

    /// Length of a list (0 when absent)
    async fn llen(&self, key: &str) -> Result<usize, StoreError>;

    /// Set a hash field, returning true when the field is new
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError>;

    /// Check whether a hash field exists
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Read every field of a hash
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Read a scalar
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a scalar only if the key is absent
    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Atomically replace a scalar, returning the previous value
    async fn getset(&self, key: &str, value: &str) -> Result<Option<String>, StoreError>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete keys, returning how many existed
    async fn del(&self, keys: &[String]) -> Result<usize, StoreError>;

    /// Execute a batch all-or-nothing.
    ///
    /// Returns `None` without applying anything when the batch guard fails.
    async fn exec(&self, batch: Batch) -> Result<Option<Vec<Reply>>, StoreError>;

    /// The store's own clock
    async fn time(&self) -> Result<DateTime<Utc>, StoreError>;

    /// Number of live keys
    async fn dbsize(&self) -> Result<usize, StoreError>;
}
