//! Behaviour every in-process backend must share.

use std::sync::Arc;

use shorty_storage::{BatchItem, FileStore, MemoryStore, StoreError, UrlStore};
use tempfile::TempDir;

/// Keeps the temp dir of a file store alive for the duration of a test.
struct Backend {
    store: Arc<dyn UrlStore>,
    _dir: Option<TempDir>,
}

async fn memory() -> Backend {
    Backend {
        store: Arc::new(MemoryStore::new()),
        _dir: None,
    }
}

async fn file() -> Backend {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("urls.json")).await.unwrap();
    Backend {
        store: Arc::new(store),
        _dir: Some(dir),
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn example_scenario(store: &dyn UrlStore) {
    assert_eq!(store.set("foo", "https://go.dev/", "u1").await.unwrap(), "foo");
    assert_eq!(
        store.set("bar", "https://go.dev/", "u1").await.unwrap_err(),
        StoreError::UrlAlreadyExists {
            short_id: "foo".to_string()
        }
    );
    assert_eq!(
        store.get("bar").await.unwrap_err(),
        StoreError::UrlNotFound("bar".to_string())
    );
}

async fn soft_delete_frees_url(store: &dyn UrlStore) {
    store.set("foo", "https://go.dev/", "u1").await.unwrap();

    store.delete_user_urls("u1", &ids(&["foo"])).await.unwrap();

    assert_eq!(
        store.get("foo").await.unwrap_err(),
        StoreError::UrlIsDeleted("foo".to_string())
    );
    assert_eq!(store.set("bar", "https://go.dev/", "u1").await.unwrap(), "bar");
    assert_eq!(store.get("bar").await.unwrap(), "https://go.dev/");
}

async fn ownership_isolation(store: &dyn UrlStore) {
    store.set("b1", "https://b.example/", "owner-b").await.unwrap();
    let before = store.urls_by_owner("owner-b").await.unwrap();

    store
        .delete_user_urls("owner-a", &ids(&["b1"]))
        .await
        .unwrap();

    assert_eq!(store.get("b1").await.unwrap(), "https://b.example/");
    assert_eq!(store.urls_by_owner("owner-b").await.unwrap(), before);
}

async fn anonymous_cannot_delete(store: &dyn UrlStore) {
    store.set("anon", "https://go.dev/", "").await.unwrap();

    store.delete_user_urls("", &ids(&["anon"])).await.unwrap();

    assert_eq!(store.get("anon").await.unwrap(), "https://go.dev/");
    assert!(store.urls_by_owner("").await.unwrap().is_empty());
}

async fn batch_dedup(store: &dyn UrlStore) {
    store.set("old", "https://existing.example/", "u1").await.unwrap();

    let items = vec![
        BatchItem::new("a", "https://go.dev/", "u1"),
        BatchItem::new("b", "https://go.dev/", "u1"),
        BatchItem::new("c", "https://existing.example/", "u2"),
    ];
    let assigned = store.save_batch(&items).await.unwrap();

    assert_eq!(assigned.len(), 2);
    assert_eq!(assigned["https://go.dev/"], "a");
    assert_eq!(assigned["https://existing.example/"], "old");
    assert!(store.get("b").await.is_err());
    assert!(store.get("c").await.is_err());

    assert!(store.save_batch(&[]).await.unwrap().is_empty());
}

async fn listing(store: &dyn UrlStore) {
    store.set("a", "https://a.example/", "u1").await.unwrap();
    store.set("b", "https://b.example/", "u1").await.unwrap();
    store.set("c", "https://c.example/", "u2").await.unwrap();

    let owned = store.urls_by_owner("u1").await.unwrap();

    assert_eq!(owned.len(), 2);
    assert_eq!(owned["a"], "https://a.example/");
    assert_eq!(owned["b"], "https://b.example/");
    assert!(store.urls_by_owner("nobody").await.unwrap().is_empty());
}

async fn ping_and_cleanup(store: &dyn UrlStore) {
    store.ping().await.unwrap();
    store.set("foo", "https://go.dev/", "u1").await.unwrap();

    store.cleanup().await.unwrap();

    assert!(store.urls_by_owner("u1").await.unwrap().is_empty());
    assert_eq!(store.set("bar", "https://go.dev/", "u1").await.unwrap(), "bar");
}

macro_rules! contract_tests {
    ($backend:ident: $($case:ident),+ $(,)?) => {
        mod $backend {
            $(
                #[tokio::test]
                async fn $case() {
                    let backend = super::$backend().await;
                    super::$case(backend.store.as_ref()).await;
                }
            )+
        }
    };
}

contract_tests!(memory:
    example_scenario,
    soft_delete_frees_url,
    ownership_isolation,
    anonymous_cannot_delete,
    batch_dedup,
    listing,
    ping_and_cleanup,
);

contract_tests!(file:
    example_scenario,
    soft_delete_frees_url,
    ownership_isolation,
    anonymous_cannot_delete,
    batch_dedup,
    listing,
    ping_and_cleanup,
);
