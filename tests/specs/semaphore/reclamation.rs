//! Stale holder reclamation specs
//!
//! Verify tokens held by crashed clients return to the pool.

use crate::prelude::*;
use crate::prelude::assert_eq;

fn stale_after(name: &str, resources: u32, secs: u64) -> SemaphoreConfig {
    pool(name, resources).with_stale_client_timeout(Duration::from_secs(secs))
}

#[tokio::test]
async fn crashed_holder_token_is_recovered() {
    let cluster = Cluster::new();
    let config = stale_after("crash", 1, 2);
    let crashed = cluster.client(&config);
    let survivor = cluster.client(&config);

    let token = crashed.try_acquire().await.unwrap().unwrap();
    drop(crashed);
    assert_eq!(survivor.try_acquire().await.unwrap(), None);

    cluster.advance(Duration::from_secs(3));
    // Throttled: the survivor already ran recovery moments ago
    assert_eq!(survivor.try_acquire().await.unwrap(), None);

    cluster.advance(Duration::from_secs(30));
    assert_eq!(survivor.try_acquire().await.unwrap(), Some(token));
}

#[tokio::test]
async fn fresh_client_reclaims_on_first_failure() {
    let cluster = Cluster::new();
    let config = stale_after("newcomer", 1, 2);
    cluster.client(&config).try_acquire().await.unwrap().unwrap();

    cluster.advance(Duration::from_secs(5));

    let newcomer = cluster.client(&config);
    assert_eq!(newcomer.try_acquire().await.unwrap(), Some(Token::new("0")));
}

#[tokio::test]
async fn reclaimed_holder_no_longer_holds() {
    let cluster = Cluster::new();
    let config = stale_after("evicted", 2, 10);
    let slow = cluster.client(&config);
    let janitor = cluster.client(&config);

    let token = slow.try_acquire().await.unwrap().unwrap();
    cluster.advance(Duration::from_secs(11));

    let outcome = janitor.reclaim_stale().await.unwrap();
    assert_eq!(outcome.reclaimed().to_vec(), vec![token.clone()]);

    assert!(!slow.holds_any().await.unwrap());
    assert!(!slow.release(&token).await.unwrap());
    assert_eq!(slow.available_count().await.unwrap(), 2);
}

#[tokio::test]
async fn recovery_is_throttled_per_client() {
    let cluster = Cluster::new();
    let config = stale_after("throttled", 1, 60);
    let holder = cluster.client(&config);
    let waiter = cluster.client(&config);
    holder.try_acquire().await.unwrap().unwrap();

    waiter.try_acquire().await.unwrap();
    cluster.store.clear_calls();
    waiter.try_acquire().await.unwrap();

    let scanned = cluster
        .store
        .calls()
        .into_iter()
        .any(|call| matches!(call, StoreCall::HGetAll { .. } | StoreCall::GetSet { .. }));
    assert!(!scanned, "throttled attempt should only pop");
}

#[tokio::test]
async fn persistent_holders_survive_without_stale_timeout() {
    let cluster = Cluster::new();
    let config = pool("forever", 1);
    let holder = cluster.client(&config);
    let waiter = cluster.client(&config);
    let token = holder.try_acquire().await.unwrap().unwrap();

    cluster.advance(Duration::from_secs(24 * 3600));

    assert_eq!(waiter.try_acquire().await.unwrap(), None);
    assert_eq!(waiter.reclaim_stale().await.unwrap(), ReclaimOutcome::Skipped);
    assert!(holder.is_locked(&token).await.unwrap());
}
