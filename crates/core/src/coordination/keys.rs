// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store key names for a pool

/// Namespaced keys for one pool, computed once at construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolKeys {
    pub available: String,
    pub grabbed: String,
    pub exists: String,
    pub version: String,
    pub release_mutex: String,
}

impl PoolKeys {
    pub fn new(name: &str) -> Self {
        let key = |suffix: &str| format!("SEMAPHORE:{}:{}", name, suffix);
        Self {
            available: key("AVAILABLE"),
            grabbed: key("GRABBED"),
            exists: key("EXISTS"),
            version: key("VERSION"),
            release_mutex: key("RELEASE_LOCKS"),
        }
    }

    /// The four keys that make up pool state (the mutex key is transient)
    pub fn pool(&self) -> [&str; 4] {
        [&self.available, &self.grabbed, &self.exists, &self.version]
    }
}
