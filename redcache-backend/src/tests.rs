use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::format::BincodeFormat;
use crate::testing::{FailingBackend, MemoryBackend};
use crate::{Backend, BackendError, EMPTY_ENTRY, Manager, Ttl};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    lines: Vec<String>,
}

fn order() -> Order {
    Order {
        id: 12,
        lines: vec!["tea".to_owned(), "scones".to_owned()],
    }
}

#[tokio::test]
async fn put_then_get_returns_the_value() {
    let backend = MemoryBackend::new();
    assert!(backend.put("order:12", &order(), None).await.unwrap());

    let cached: Option<Order> = backend.get("order:12").await.unwrap();
    assert_eq!(cached, Some(order()));
}

#[tokio::test]
async fn get_on_never_set_key_returns_default() {
    let backend = MemoryBackend::new();
    let value = backend.get_or("nope", 5_u32).await.unwrap();
    assert_eq!(value, 5);
    assert_eq!(backend.get::<u32>("nope").await.unwrap(), None);
}

#[tokio::test]
async fn forget_then_get_returns_default() {
    let backend = MemoryBackend::new();
    backend.forever("k", &"v").await.unwrap();

    assert!(backend.forget("k").await.unwrap());
    assert!(!backend.forget("k").await.unwrap());
    assert_eq!(backend.get_or("k", "gone".to_owned()).await.unwrap(), "gone");
}

#[tokio::test]
async fn put_without_ttl_sends_no_expiry() {
    let backend = MemoryBackend::new();
    backend.put("k", &1, None).await.unwrap();
    assert_eq!(backend.last_ttl(), Some(None));

    backend.put("k", &1, Ttl::Seconds(30)).await.unwrap();
    assert_eq!(backend.last_ttl(), Some(Some(Duration::from_secs(30))));
}

#[tokio::test]
async fn elapsed_ttl_forgets_instead_of_storing() {
    let backend = MemoryBackend::new();
    backend.forever("k", &"old").await.unwrap();

    let past = Utc::now() - chrono::Duration::minutes(1);
    assert!(!backend.put("k", &"new", Ttl::At(past)).await.unwrap());
    assert!(!backend.contains("k"));
    assert_eq!(backend.writes(), 1);
}

#[tokio::test]
async fn add_only_writes_absent_keys() {
    let backend = MemoryBackend::new();
    assert!(backend.add("k", &"first", None).await.unwrap());
    assert!(!backend.add("k", &"second", None).await.unwrap());

    assert_eq!(backend.get::<String>("k").await.unwrap().as_deref(), Some("first"));
}

#[tokio::test]
async fn has_and_missing_are_complements() {
    let backend = MemoryBackend::new();
    assert!(backend.missing("k").await.unwrap());
    assert!(!backend.has("k").await.unwrap());

    backend.forever("k", &0).await.unwrap();
    assert!(backend.has("k").await.unwrap());
    assert!(!backend.missing("k").await.unwrap());
}

#[tokio::test]
async fn increment_updates_stored_json_integer() {
    let backend = MemoryBackend::new();
    backend.forever("hits", &10_i64).await.unwrap();

    assert_eq!(backend.increment("hits", 5).await.unwrap(), 15);
    assert_eq!(backend.get::<i64>("hits").await.unwrap(), Some(15));

    assert_eq!(backend.decrement("hits", 20).await.unwrap(), -5);
    assert_eq!(backend.get_or("hits", 0_i64).await.unwrap(), -5);
}

#[tokio::test]
async fn increment_on_missing_key_starts_from_zero() {
    let backend = MemoryBackend::new();
    assert_eq!(backend.increment("fresh", 3).await.unwrap(), 3);
}

#[tokio::test]
async fn increment_on_non_integer_fails() {
    let backend = MemoryBackend::new();
    backend.forever("name", &"ada").await.unwrap();

    let result = backend.increment("name", 1).await;
    assert!(matches!(result, Err(BackendError::InternalError(_))));
}

#[tokio::test]
async fn pull_returns_and_removes() {
    let backend = MemoryBackend::new();
    backend.forever("token", &"abc").await.unwrap();

    assert_eq!(backend.pull::<String>("token").await.unwrap().as_deref(), Some("abc"));
    assert!(!backend.contains("token"));
    assert_eq!(backend.pull_or("token", "none".to_owned()).await.unwrap(), "none");
}

#[tokio::test]
async fn remember_invokes_producer_once() {
    let backend = MemoryBackend::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let calls = calls.clone();
        let value = backend
            .remember("report", Ttl::Seconds(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                order()
            })
            .await
            .unwrap();
        assert_eq!(value, order());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.last_ttl(), Some(Some(Duration::from_secs(60))));
}

#[tokio::test]
async fn sear_stores_without_expiry() {
    let backend = MemoryBackend::new();
    let value = backend.sear("config", || async { 42_u8 }).await.unwrap();
    assert_eq!(value, 42);
    assert_eq!(backend.last_ttl(), Some(None));

    let again = backend
        .remember_forever("config", || async { 0_u8 })
        .await
        .unwrap();
    assert_eq!(again, 42);
}

#[tokio::test]
async fn concurrent_remember_runs_every_missing_producer() {
    let backend = MemoryBackend::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(tokio::sync::Barrier::new(2));

    let run = |backend: MemoryBackend| {
        let calls = calls.clone();
        let gate = gate.clone();
        async move {
            backend
                .remember("slow", None, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.wait().await;
                    1_u32
                })
                .await
                .unwrap()
        }
    };

    let (a, b) = tokio::join!(run(backend.clone()), run(backend.clone()));
    assert_eq!((a, b), (1, 1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fetch_or_create_skips_none_unless_asked() {
    let backend = MemoryBackend::new();

    let value: Option<u32> = backend
        .fetch_or_create("maybe", None, || async { None }, false)
        .await
        .unwrap();
    assert_eq!(value, None);
    assert!(!backend.contains("maybe"));

    let value: Option<u32> = backend
        .fetch_or_create("maybe", None, || async { None }, true)
        .await
        .unwrap();
    assert_eq!(value, None);
    assert!(backend.contains("maybe"));

    let value: Option<u32> = backend
        .fetch_or_create("maybe", None, || async { Some(9) }, true)
        .await
        .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn remembered_none_reads_as_a_miss() {
    let backend = MemoryBackend::new();
    let value: Option<String> = backend
        .fetch_or_create("lookup", None, || async { None }, true)
        .await
        .unwrap();
    assert_eq!(value, None);

    assert_eq!(backend.raw("lookup").as_deref(), Some(EMPTY_ENTRY));
    assert_eq!(backend.get::<String>("lookup").await.unwrap(), None);
    assert!(!backend.has("lookup").await.unwrap());
    assert!(backend.missing("lookup").await.unwrap());
    assert_eq!(backend.lookup::<String>("lookup").await.unwrap(), Some(None));
    assert_eq!(backend.lookup::<String>("other").await.unwrap(), None);
}

#[tokio::test]
async fn fetch_or_create_shares_keys_with_put_and_get() {
    let backend = MemoryBackend::with_format(BincodeFormat);

    let created = backend
        .fetch_or_create("n", None, || async { Some(5_u32) }, false)
        .await
        .unwrap();
    assert_eq!(created, Some(5));
    assert_eq!(backend.get::<u32>("n").await.unwrap(), Some(5));

    backend.forever("m", &7_u32).await.unwrap();
    let fetched = backend
        .fetch_or_create("m", None, || async { Some(0_u32) }, false)
        .await
        .unwrap();
    assert_eq!(fetched, Some(7));
}

#[tokio::test]
async fn bincode_backend_round_trips_structs() {
    let backend = MemoryBackend::with_format(BincodeFormat);
    backend.forever("order", &order()).await.unwrap();
    assert_eq!(backend.get::<Order>("order").await.unwrap(), Some(order()));
}

#[tokio::test]
async fn dyn_backend_gets_manager_operations() {
    let backend: Arc<dyn Backend + Send + 'static> = Arc::new(MemoryBackend::new());
    backend.forever("k", &"v").await.unwrap();
    assert_eq!(backend.get::<String>("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(backend.label().as_str(), "memory");
}

#[tokio::test]
async fn failures_propagate_as_errors() {
    let backend = FailingBackend::new();
    let result = backend.get::<u32>("k").await;
    assert!(result.unwrap_err().is_connection_error());
    assert!(backend.put("k", &1, None).await.is_err());
    assert_eq!(backend.calls(), 2);
}
