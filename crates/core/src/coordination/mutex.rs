// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-expiring mutual exclusion over a single store key
//!
//! The key holds the owner's expiry as unix milliseconds. Nobody ever waits
//! for an unlock: a record whose expiry has passed may be claimed by anyone,
//! with a read-and-replace that detects a concurrent claimant.

use super::pool::{millis, Pool};
use crate::clock::Clock;
use crate::store::{Store, StoreError};
use std::future::Future;
use std::time::Duration;

/// Tolerated drift between cooperating clocks
pub const SKEW_GRACE: Duration = Duration::from_secs(1);

/// Unparseable or missing records read as already expired
fn parse_expiry(value: Option<String>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// A mutex that releases itself `ttl` after it was taken
#[derive(Clone)]
pub struct ExpiringMutex<S: Store, C: Clock> {
    pool: Pool<S, C>,
    key: String,
    ttl: Duration,
}

impl<S: Store, C: Clock> ExpiringMutex<S, C> {
    pub fn new(pool: Pool<S, C>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run `body` if the mutex can be taken right now.
    ///
    /// Returns `Ok(None)` without running `body` when another owner's window
    /// is still open. The key is removed after `body` on every exit path,
    /// unless our own window has lapsed and someone else may own it now.
    pub async fn with_lock<F, Fut, T, E>(&self, body: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        let Some(my_expiry) = self.try_lock().await? else {
            tracing::debug!(key = %self.key, "expiring mutex held elsewhere, skipping");
            return Ok(None);
        };

        let result = body().await;
        let unlocked = self.unlock(my_expiry).await;
        let value = result?;
        unlocked?;
        Ok(Some(value))
    }

    async fn try_lock(&self) -> Result<Option<i64>, StoreError> {
        let store = self.pool.store();
        let now = self.pool.now_millis().await?;
        let my_expiry = now
            .saturating_add(millis(self.ttl))
            .saturating_add(millis(SKEW_GRACE));
        let my_value = my_expiry.to_string();

        if store.set_nx(&self.key, &my_value).await? {
            return Ok(Some(my_expiry));
        }

        let other_expiry = parse_expiry(store.get(&self.key).await?);
        if other_expiry >= now {
            return Ok(None);
        }

        // The previous owner's window lapsed; only the first replacer wins
        let replaced = parse_expiry(store.getset(&self.key, &my_value).await?);
        if replaced == other_expiry {
            tracing::debug!(key = %self.key, other_expiry, "took over lapsed expiring mutex");
            Ok(Some(my_expiry))
        } else {
            Ok(None)
        }
    }

    async fn unlock(&self, my_expiry: i64) -> Result<(), StoreError> {
        let now = self.pool.now_millis().await?;
        if my_expiry > now - millis(SKEW_GRACE) {
            self.pool.store().del(&[self.key.clone()]).await?;
        } else {
            tracing::warn!(
                key = %self.key,
                overrun_ms = now - my_expiry,
                "expiring mutex outlived its window, leaving key in place"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
