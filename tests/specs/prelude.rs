//! Shared fixtures for semaphore specs

#![allow(dead_code, unused_imports)]

pub use similar_asserts::assert_eq;
pub use std::time::Duration;
pub use turnstile_adapters::{FakeStore, StoreCall, TracedStore};
pub use turnstile_core::{
    Clock, FakeClock, ReclaimOutcome, Semaphore, SemaphoreConfig, SemaphoreError, Store, StoreError,
    Token,
};

pub type Client = Semaphore<FakeStore, FakeClock>;

/// Several clients sharing one fake store and one clock
pub struct Cluster {
    pub store: FakeStore,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            store: FakeStore::new(),
        }
    }

    /// A fresh client: its own held tokens, throttle and id
    pub fn client(&self, config: &SemaphoreConfig) -> Client {
        Semaphore::with_clock(self.store.clone(), config.clone(), self.store.clock().clone())
            .unwrap()
    }

    pub fn clients(&self, config: &SemaphoreConfig, count: usize) -> Vec<Client> {
        (0..count).map(|_| self.client(config)).collect()
    }

    pub fn advance(&self, duration: Duration) {
        self.store.clock().advance(duration);
    }

    /// Number of tokens currently recorded as held
    pub async fn holders(&self, client: &Client) -> usize {
        self.store
            .memory()
            .hgetall(&client.keys().grabbed)
            .await
            .unwrap()
            .len()
    }

    pub async fn key_count(&self) -> usize {
        self.store.memory().dbsize().await.unwrap()
    }
}

pub fn pool(name: &str, resources: u32) -> SemaphoreConfig {
    SemaphoreConfig::new(name).with_resources(resources)
}
