// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance rate limit for pool recovery work

use crate::clock::Clock;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Lets one attempt through per `interval`; the first attempt always passes
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Claim the next slot if the interval has elapsed since the last one
    pub fn try_begin(&self, clock: &impl Clock) -> bool {
        let now = clock.now();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
