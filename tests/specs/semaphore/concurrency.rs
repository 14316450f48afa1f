//! Concurrency specs
//!
//! Verify the capacity bound holds under contention from many clients.

use crate::prelude::*;
use crate::prelude::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_holders_never_exceed_capacity() {
    let cluster = Cluster::new();
    let config = pool("contended", 3);
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for client in cluster.clients(&config, 10) {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        tasks.push(tokio::spawn(async move {
            client
                .with_token(Some(Duration::from_secs(10)), |_| async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await
        }));
    }

    let mut completed = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_some() {
            completed += 1;
        }
    }

    assert_eq!(completed, 10);
    assert!(peak.load(Ordering::SeqCst) <= 3);

    let observer = cluster.client(&config);
    assert_eq!(observer.available_count().await.unwrap(), 3);
    assert_eq!(cluster.holders(&observer).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creators_build_one_pool() {
    let cluster = Cluster::new();
    let config = pool("race", 4);

    let mut tasks = Vec::new();
    for client in cluster.clients(&config, 8) {
        tasks.push(tokio::spawn(async move { client.ensure_exists().await }));
    }

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    let mut tokens = cluster.client(&config).all_tokens().await.unwrap();
    tokens.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(
        tokens,
        vec![
            Token::new("0"),
            Token::new("1"),
            Token::new("2"),
            Token::new("3")
        ]
    );
}
