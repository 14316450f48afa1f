// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stale holder reclamation
//!
//! A process that dies while holding a token never releases it. The reclaimer
//! scans the holder map and requeues every token held longer than the stale
//! threshold. Scans are serialized across processes by an [`ExpiringMutex`].

use super::mutex::ExpiringMutex;
use super::pool::{millis, Pool};
use super::token::Token;
use crate::clock::Clock;
use crate::store::{Store, StoreError};
use std::time::Duration;

/// How long one scan may keep other processes from scanning
pub const RECLAIM_MUTEX_TTL: Duration = Duration::from_secs(10);

/// Result of one reclamation attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Another process holds the scan mutex, or staleness checking is off
    Skipped,
    /// A scan ran and requeued these tokens
    Completed { reclaimed: Vec<Token> },
}

impl ReclaimOutcome {
    pub fn reclaimed(&self) -> &[Token] {
        match self {
            ReclaimOutcome::Skipped => &[],
            ReclaimOutcome::Completed { reclaimed } => reclaimed,
        }
    }
}

/// Requeues tokens whose holders went quiet
#[derive(Clone)]
pub struct StaleReclaimer<S: Store, C: Clock> {
    pool: Pool<S, C>,
    mutex: ExpiringMutex<S, C>,
    stale_after: Duration,
}

impl<S: Store, C: Clock> StaleReclaimer<S, C> {
    pub fn new(pool: Pool<S, C>, stale_after: Duration) -> Self {
        let mutex = ExpiringMutex::new(
            pool.clone(),
            pool.keys().release_mutex.clone(),
            RECLAIM_MUTEX_TTL,
        );
        Self {
            pool,
            mutex,
            stale_after,
        }
    }

    /// Run one scan if no other process is scanning
    pub async fn reclaim(&self) -> Result<ReclaimOutcome, StoreError> {
        let scanned = self.mutex.with_lock(|| self.scan()).await?;
        Ok(match scanned {
            Some(reclaimed) => ReclaimOutcome::Completed { reclaimed },
            None => ReclaimOutcome::Skipped,
        })
    }

    async fn scan(&self) -> Result<Vec<Token>, StoreError> {
        let keys = self.pool.keys();
        let mut holders: Vec<(String, String)> = self
            .pool
            .store()
            .hgetall(&keys.grabbed)
            .await?
            .into_iter()
            .collect();
        holders.sort();

        let now = self.pool.now_millis().await?;
        let stale_ms = millis(self.stale_after);
        let mut reclaimed = Vec::new();

        for (token, acquired_at) in holders {
            let acquired_at_ms = acquired_at.trim().parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(
                    pool = %keys.grabbed,
                    token,
                    acquired_at,
                    "unreadable acquisition time, treating holder as stale"
                );
                0
            });
            if acquired_at_ms.saturating_add(stale_ms) >= now {
                continue;
            }

            let token = Token(token);
            // Guarded: a holder releasing concurrently wins and we skip
            if self.pool.requeue(&token).await? {
                tracing::warn!(
                    pool = %keys.available,
                    %token,
                    held_ms = now.saturating_sub(acquired_at_ms),
                    "reclaimed stale token"
                );
                reclaimed.push(token);
            }
        }

        Ok(reclaimed)
    }
}

#[cfg(test)]
#[path = "reclaim_tests.rs"]
mod tests;
