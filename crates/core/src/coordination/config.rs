// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore configuration
//!
//! Durations are written in humantime form when loaded from TOML:
//!
//! ```toml
//! name = "renders"
//! resources = 4
//! expiration = "1h"
//! stale_client_timeout = "5m"
//! create_release_interval = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default throttle between pool creation / stale reclamation attempts
pub const DEFAULT_CREATE_RELEASE_INTERVAL: Duration = Duration::from_secs(30);

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid semaphore config: {0}")]
    Invalid(String),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_resources() -> u32 {
    1
}

fn default_create_release_interval() -> Duration {
    DEFAULT_CREATE_RELEASE_INTERVAL
}

/// Semaphore configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemaphoreConfig {
    /// Pool name, used to namespace store keys
    pub name: String,
    /// Number of tokens in the pool
    #[serde(default = "default_resources")]
    pub resources: u32,
    /// TTL refreshed on every pool key after each mutation (none = persistent)
    #[serde(default, with = "humantime_serde")]
    pub expiration: Option<Duration>,
    /// Hold duration after which a token may be reclaimed (none = never)
    #[serde(default, with = "humantime_serde")]
    pub stale_client_timeout: Option<Duration>,
    /// Minimum gap between creation / reclamation attempts of one instance
    #[serde(
        default = "default_create_release_interval",
        with = "humantime_serde"
    )]
    pub create_release_interval: Duration,
    /// Use this process's clock instead of the store's
    #[serde(default)]
    pub use_local_time: bool,
}

impl SemaphoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: default_resources(),
            expiration: None,
            stale_client_timeout: None,
            create_release_interval: DEFAULT_CREATE_RELEASE_INTERVAL,
            use_local_time: false,
        }
    }

    pub fn with_resources(mut self, resources: u32) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_stale_client_timeout(mut self, timeout: Duration) -> Self {
        self.stale_client_timeout = Some(timeout);
        self
    }

    pub fn with_create_release_interval(mut self, interval: Duration) -> Self {
        self.create_release_interval = interval;
        self
    }

    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.use_local_time = enabled;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if self.resources == 0 {
            return Err(ConfigError::Invalid(
                "resources must be at least 1".to_string(),
            ));
        }
        if self.expiration.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::Invalid(
                "expiration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
