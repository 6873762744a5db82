//! Tests against a running Redis server.
//!
//! Ignored by default. Run with `REDIS_URL` pointing at a disposable server:
//! `REDIS_URL=redis://127.0.0.1:6379 cargo test -p redcache-redis -- --ignored`

use std::time::Duration;

use redcache_backend::format::BincodeFormat;
use redcache_backend::{Backend, Manager, Ttl};
use redcache_redis::{Configuration, ManagerBuilder, PooledRedisManager, RedisManager};

fn config(prefix: &str) -> Configuration {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_owned());
    let mut config = Configuration::from_url(url);
    config.options.prefix = Some(prefix.to_owned());
    config
}

async fn exercise<M: Manager>(manager: &M) {
    manager.forget("counter").await.unwrap();
    manager.forget("greeting").await.unwrap();

    assert!(manager.put("greeting", &"hello", None).await.unwrap());
    assert_eq!(
        manager.get::<String>("greeting").await.unwrap().as_deref(),
        Some("hello")
    );

    assert_eq!(manager.increment("counter", 5).await.unwrap(), 5);
    assert_eq!(manager.decrement("counter", 2).await.unwrap(), 3);
    assert_eq!(manager.get::<i64>("counter").await.unwrap(), Some(3));

    assert!(manager.forget("greeting").await.unwrap());
    assert!(!manager.forget("greeting").await.unwrap());
    manager.forget("counter").await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn managed_single_node() {
    let manager = RedisManager::connect(config("redcache-test-managed"))
        .await
        .unwrap();
    exercise(&manager).await;
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn managed_without_persistent_connection() {
    let mut config = config("redcache-test-oneoff");
    config.options.persistent = false;
    let manager = RedisManager::connect(config).await.unwrap();
    exercise(&manager).await;
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn pooled_single_node() {
    let manager = PooledRedisManager::connect(config("redcache-test-pooled"))
        .await
        .unwrap();
    exercise(&manager).await;
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn ttl_expires_entries() {
    let manager = RedisManager::connect(config("redcache-test-ttl"))
        .await
        .unwrap();
    manager
        .put("short", &1, Ttl::Duration(Duration::from_millis(200)))
        .await
        .unwrap();
    assert!(manager.has("short").await.unwrap());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(manager.missing("short").await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn prefix_isolates_namespaces() {
    let left = RedisManager::connect(config("redcache-test-left"))
        .await
        .unwrap();
    let right = RedisManager::connect(config("redcache-test-right"))
        .await
        .unwrap();

    left.forever("shared", &"left").await.unwrap();
    assert_eq!(right.get::<String>("shared").await.unwrap(), None);
    left.forget("shared").await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn bincode_values_round_trip() {
    let manager = ManagerBuilder::new(config("redcache-test-bincode"))
        .value_format(BincodeFormat)
        .label("bincode")
        .single()
        .await
        .unwrap();
    assert_eq!(manager.label().as_str(), "bincode");

    manager.forever("pair", &(7_u16, "seven".to_owned())).await.unwrap();
    let pair: Option<(u16, String)> = manager.pull("pair").await.unwrap();
    assert_eq!(pair, Some((7, "seven".to_owned())));
}
