//! Acquisition and release specs
//!
//! Verify capacity limits and the order tokens are handed out.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn single_resource_acquire_and_release() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("single", 1));

    let token = client.try_acquire().await.unwrap().unwrap();
    assert_eq!(client.available_count().await.unwrap(), 0);

    client.release(&token).await.unwrap();
    assert_eq!(client.available_count().await.unwrap(), 1);
}

#[tokio::test]
async fn third_request_on_two_tokens_fails_fast() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("pair", 2));

    assert_eq!(client.try_acquire().await.unwrap(), Some(Token::new("0")));
    assert_eq!(client.try_acquire().await.unwrap(), Some(Token::new("1")));
    assert_eq!(client.try_acquire().await.unwrap(), None);
}

#[tokio::test]
async fn capacity_is_shared_across_clients() {
    let cluster = Cluster::new();
    let config = pool("shared", 2);
    let clients = cluster.clients(&config, 3);

    let mut outcomes = Vec::new();
    for client in &clients {
        outcomes.push(client.try_acquire().await.unwrap());
    }

    assert_eq!(
        outcomes,
        vec![Some(Token::new("0")), Some(Token::new("1")), None]
    );
    assert_eq!(cluster.holders(&clients[0]).await, 2);
}

#[tokio::test]
async fn released_token_goes_to_head_of_queue() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("lifo", 3));

    client.try_acquire().await.unwrap().unwrap();
    let second = client.try_acquire().await.unwrap().unwrap();
    client.release(&second).await.unwrap();

    assert_eq!(client.try_acquire().await.unwrap(), Some(second));
}

#[tokio::test]
async fn waiting_client_is_woken_by_release() {
    let cluster = Cluster::new();
    let config = pool("handoff", 1);
    let holder = cluster.client(&config);
    let waiter = cluster.client(&config);
    let token = holder.try_acquire().await.unwrap().unwrap();

    let pending = tokio::spawn(async move { waiter.acquire(None).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished());

    holder.release(&token).await.unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), Some(token));
}

#[tokio::test]
async fn with_token_scopes_ownership() {
    let cluster = Cluster::new();
    let client = cluster.client(&pool("scoped", 1));

    let inside = client
        .with_token(None, |token| {
            let client = client.clone();
            async move { client.is_locked(&token).await.unwrap() }
        })
        .await
        .unwrap();

    assert_eq!(inside, Some(true));
    assert!(!client.holds_any().await.unwrap());
    assert_eq!(client.available_count().await.unwrap(), 1);
}
