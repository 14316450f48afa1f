//! Pool lifecycle specs
//!
//! Verify creation, expiration, configuration loading and teardown.

use crate::prelude::*;
use crate::prelude::assert_eq;
use std::io::Write;

#[tokio::test]
async fn pool_is_created_lazily() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("lazy", 3));

    assert_eq!(client.available_count().await.unwrap(), 3);
    assert!(!client.exists().await.unwrap());
    assert_eq!(cluster.key_count().await, 0);

    client.try_acquire().await.unwrap().unwrap();

    assert!(client.exists().await.unwrap());
    assert_eq!(client.available_count().await.unwrap(), 2);
}

#[tokio::test]
async fn destroy_leaves_no_keys() {
    let cluster = Cluster::new();
    let config = pool("teardown", 2).with_stale_client_timeout(Duration::from_secs(1));
    let clients = cluster.clients(&config, 2);

    clients[0].try_acquire().await.unwrap().unwrap();
    clients[0].try_acquire().await.unwrap().unwrap();
    cluster.advance(Duration::from_secs(5));
    clients[1].try_acquire().await.unwrap().unwrap();

    clients[1].destroy().await.unwrap();

    assert_eq!(cluster.key_count().await, 0);
    assert!(cluster.store.memory().keys().is_empty());
}

#[tokio::test]
async fn idle_pool_expires_and_is_rebuilt() {
    let cluster = Cluster::new();
    let config = pool("ephemeral", 2).with_expiration(Duration::from_secs(30));
    let client = cluster.client(&config);

    let token = client.try_acquire().await.unwrap().unwrap();
    cluster.advance(Duration::from_secs(20));
    client.release(&token).await.unwrap();

    // Refreshed by the release, so still present
    cluster.advance(Duration::from_secs(20));
    assert!(client.exists().await.unwrap());

    cluster.advance(Duration::from_secs(11));
    assert_eq!(cluster.key_count().await, 0);

    let late = cluster.client(&config);
    assert!(late.try_acquire().await.unwrap().is_some());
    assert_eq!(late.all_tokens().await.unwrap().len(), 2);
}

#[tokio::test]
async fn config_loaded_from_file_drives_pool() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
name = "from-file"
resources = 2
expiration = "5m"
stale_client_timeout = "30s"
"#
    )
    .unwrap();

    let config = SemaphoreConfig::load(file.path()).unwrap();
    assert_eq!(config.expiration, Some(Duration::from_secs(300)));

    let cluster = Cluster::new();
    let client = cluster.client(&config);
    client.try_acquire().await.unwrap().unwrap();

    assert_eq!(
        cluster.store.memory().ttl(&client.keys().available),
        Some(Duration::from_secs(300))
    );
    assert_eq!(client.available_count().await.unwrap(), 1);
}

#[tokio::test]
async fn local_time_stamps_holders_with_client_clock() {
    let cluster = Cluster::new();
    let skewed = FakeClock::new();
    skewed.set_utc(cluster.store.memory().time().await.unwrap() + chrono::Duration::days(1));

    let config = pool("skewed", 1).with_local_time(true);
    let client = Semaphore::with_clock(cluster.store.clone(), config, skewed.clone()).unwrap();
    let token = client.try_acquire().await.unwrap().unwrap();

    let held = cluster
        .store
        .memory()
        .hgetall(&client.keys().grabbed)
        .await
        .unwrap();
    let stamped: i64 = held[token.as_str()].parse().unwrap();
    assert_eq!(stamped, skewed.utc_now().timestamp_millis());
    assert!(!cluster
        .store
        .calls()
        .iter()
        .any(|call| matches!(call, StoreCall::Time)));
}
