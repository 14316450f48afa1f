// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic pool-state operations shared by the semaphore and the reclaimer

use super::config::SemaphoreConfig;
use super::keys::PoolKeys;
use super::token::Token;
use crate::clock::Clock;
use crate::store::{Batch, Reply, Store, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Value written to the existence marker
pub const EXISTS_TOKEN: &str = "0";

/// Protocol version written alongside a freshly created pool
pub const API_VERSION: &str = "1";

/// Marker TTL while creation is in flight, so a crashed creator cannot wedge the pool
pub const CREATION_TTL: Duration = Duration::from_secs(10);

/// Whole milliseconds in `duration`, saturating
pub fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Handle on one pool's keys in one store
#[derive(Clone)]
pub struct Pool<S: Store, C: Clock> {
    store: S,
    clock: C,
    keys: Arc<PoolKeys>,
    resources: u32,
    expiration: Option<Duration>,
    use_local_time: bool,
}

impl<S: Store, C: Clock> Pool<S, C> {
    pub fn new(store: S, clock: C, config: &SemaphoreConfig) -> Self {
        Self {
            store,
            clock,
            keys: Arc::new(PoolKeys::new(&config.name)),
            resources: config.resources,
            expiration: config.expiration,
            use_local_time: config.use_local_time,
        }
    }

    pub fn keys(&self) -> &PoolKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current time from the configured source (store clock unless local time is enabled)
    pub async fn now(&self) -> Result<DateTime<Utc>, StoreError> {
        if self.use_local_time {
            Ok(self.clock.utc_now())
        } else {
            self.store.time().await
        }
    }

    pub async fn now_millis(&self) -> Result<i64, StoreError> {
        Ok(self.now().await?.timestamp_millis())
    }

    /// Append TTL refreshes for every pool key when an expiration is configured
    fn with_expiration(&self, mut batch: Batch) -> Batch {
        if let Some(ttl) = self.expiration {
            for key in self.keys.pool() {
                batch = batch.expire(key, ttl);
            }
        }
        batch
    }

    /// Populate the queue with tokens `0..resources` and mark the pool created
    pub async fn create(&self) -> Result<(), StoreError> {
        let keys = &self.keys;
        self.store
            .exec(Batch::new().expire(&keys.exists, CREATION_TTL))
            .await?;

        let batch = Batch::new()
            .del(&keys.grabbed)
            .del(&keys.available)
            .rpush(&keys.available, (0..self.resources).map(|i| i.to_string()))
            .set(&keys.version, API_VERSION)
            .persist(&keys.exists);
        self.store.exec(self.with_expiration(batch)).await?;
        Ok(())
    }

    /// Record `token` as held since `acquired_at_ms`
    pub async fn grab(&self, token: &Token, acquired_at_ms: i64) -> Result<(), StoreError> {
        let batch = Batch::new().hset(
            &self.keys.grabbed,
            token.as_str(),
            &acquired_at_ms.to_string(),
        );
        self.store.exec(self.with_expiration(batch)).await?;
        Ok(())
    }

    /// Move a held token back to the queue in one guarded batch.
    ///
    /// Returns false (and changes nothing) when the token is not held.
    pub async fn requeue(&self, token: &Token) -> Result<bool, StoreError> {
        let keys = &self.keys;
        let batch = Batch::new()
            .require_field(&keys.grabbed, token.as_str())
            .hdel(&keys.grabbed, token.as_str())
            .lpush(&keys.available, token.as_str());
        Ok(self.store.exec(self.with_expiration(batch)).await?.is_some())
    }

    /// Re-arm the pool TTL; no-op for persistent pools
    pub async fn refresh_expiration(&self) -> Result<(), StoreError> {
        if self.expiration.is_some() {
            self.store.exec(self.with_expiration(Batch::new())).await?;
        }
        Ok(())
    }

    /// Every token, available ones first, read in a single batch
    pub async fn all_tokens(&self) -> Result<Vec<Token>, StoreError> {
        let replies = self
            .store
            .exec(
                Batch::new()
                    .lrange(&self.keys.available)
                    .hkeys(&self.keys.grabbed),
            )
            .await?
            .unwrap_or_default();
        Ok(replies
            .into_iter()
            .flat_map(Reply::into_values)
            .map(Token)
            .collect())
    }

    /// Delete the pool keys and the release mutex, returning how many existed
    pub async fn destroy(&self) -> Result<usize, StoreError> {
        let mut keys: Vec<String> = self.keys.pool().iter().map(|k| k.to_string()).collect();
        keys.push(self.keys.release_mutex.clone());
        self.store.del(&keys).await
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
