//! Failure specs
//!
//! Verify store errors surface to callers without losing tokens.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn store_outage_is_reported() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("outage", 1));
    client.ensure_exists().await.unwrap();

    cluster.store.go_offline();
    let result = client.try_acquire().await;
    assert!(matches!(
        result,
        Err(SemaphoreError::Store(StoreError::Unavailable(_)))
    ));

    cluster.store.go_online();
    assert_eq!(client.try_acquire().await.unwrap(), Some(Token::new("0")));
}

#[tokio::test]
async fn failed_holder_record_puts_token_back() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("restore", 1));
    client.ensure_exists().await.unwrap();

    cluster.store.fail_next_execs(1);
    let result = client.try_acquire().await;

    assert!(matches!(
        result,
        Err(SemaphoreError::Store(StoreError::CommandFailed(_)))
    ));
    assert_eq!(client.available_count().await.unwrap(), 1);
    assert_eq!(cluster.holders(&client).await, 0);
    assert!(client.held_tokens().is_empty());
}

#[tokio::test]
async fn release_after_outage_recovers() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("flaky", 1));
    let token = client.try_acquire().await.unwrap().unwrap();

    cluster.store.go_offline();
    assert!(client.release(&token).await.is_err());
    cluster.store.go_online();

    // The holder record survived, so releasing again still works
    assert!(client.release(&token).await.unwrap());
    assert_eq!(client.available_count().await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_config_never_touches_store() {
    let cluster = Cluster::new();

    let result = Semaphore::with_clock(
        cluster.store.clone(),
        SemaphoreConfig::new(""),
        cluster.store.clock().clone(),
    );

    assert!(matches!(result, Err(SemaphoreError::Config(_))));
    assert!(cluster.store.calls().is_empty());
}

#[tokio::test]
async fn failed_guard_release_falls_back_to_drop() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("guarded", 1));
    let guard = client.acquire_guard(None).await.unwrap().unwrap();
    let token = guard.token().clone();

    cluster.store.go_offline();
    assert!(guard.release().await.is_err());
    // The drop fallback is spawned but has not run yet on this thread
    cluster.store.go_online();

    let mut freed = false;
    for _ in 0..100 {
        if !client.is_locked(&token).await.unwrap() {
            freed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(freed, "token {token} was never released");
    assert_eq!(client.available_count().await.unwrap(), 1);
}
