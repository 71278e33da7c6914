//! Runs against a disposable Postgres container. Each test returns early
//! when no docker daemon can be found.

use std::time::Duration;

use shorty_storage::{BatchItem, PostgresStore, StoreError, UrlStore};
use shorty_test_infra::postgres::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

struct Fixture {
    _postgres: PostgresServer,
    pool: PgPool,
    store: PostgresStore,
}

impl Fixture {
    async fn start() -> Option<Self> {
        let postgres = match PostgresServer::new(PostgresConfig::builder().build()).await {
            Ok(postgres) => postgres,
            Err(err) if err.is_docker_unavailable() => {
                eprintln!("skipping: {err}");
                return None;
            }
            Err(err) => panic!("start postgres: {err}"),
        };
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let store = PostgresStore::new(pool.clone(), QUERY_TIMEOUT)
            .await
            .expect("create schema");

        Some(Self {
            _postgres: postgres,
            pool,
            store,
        })
    }

    async fn row(&self, short_id: &str) -> Option<(String, String, bool)> {
        sqlx::query_as(
            "SELECT original_url, user_id, is_deleted FROM urls WHERE short_id = $1",
        )
        .bind(short_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap()
    }
}

async fn connect_with_retry(url: &str) -> PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn set_and_get() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };

    let stored = fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();

    assert_eq!(stored, "foo");
    assert_eq!(fixture.store.get("foo").await.unwrap(), "https://go.dev/");
    assert_eq!(
        fixture.row("foo").await,
        Some(("https://go.dev/".to_string(), "user1".to_string(), false))
    );
}

#[tokio::test]
async fn duplicate_url_returns_existing_short_id() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };

    fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();
    let err = fixture
        .store
        .set("bar", "https://go.dev/", "user2")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::UrlAlreadyExists {
            short_id: "foo".to_string()
        }
    );
    assert_eq!(
        fixture.store.get("bar").await.unwrap_err(),
        StoreError::UrlNotFound("bar".to_string())
    );
}

#[tokio::test]
async fn taken_short_id_is_reported() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };

    fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();
    let err = fixture
        .store
        .set("foo", "https://example.com/", "user1")
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::ShortIdTaken("foo".to_string()));
}

#[tokio::test]
async fn anonymous_owner_is_rejected_by_schema() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };

    let err = fixture
        .store
        .set("foo", "https://go.dev/", "")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Constraint(_)));
    assert!(fixture.row("foo").await.is_none());
}

#[tokio::test]
async fn delete_marks_rows_and_frees_url() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();

    fixture
        .store
        .delete_user_urls("user1", &ids(&["foo", "unknown"]))
        .await
        .unwrap();

    assert_eq!(
        fixture.store.get("foo").await.unwrap_err(),
        StoreError::UrlIsDeleted("foo".to_string())
    );
    assert!(fixture.row("foo").await.unwrap().2);
    assert_eq!(
        fixture
            .store
            .set("bar", "https://go.dev/", "user2")
            .await
            .unwrap(),
        "bar"
    );
}

#[tokio::test]
async fn delete_respects_ownership() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("foo", "https://go.dev/", "owner")
        .await
        .unwrap();

    fixture
        .store
        .delete_user_urls("intruder", &ids(&["foo"]))
        .await
        .unwrap();

    assert_eq!(fixture.store.get("foo").await.unwrap(), "https://go.dev/");
    let owned = fixture.store.urls_by_owner("owner").await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned["foo"], "https://go.dev/");
}

#[tokio::test]
async fn urls_by_owner_skips_deleted() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("a", "https://a.example/", "user1")
        .await
        .unwrap();
    fixture
        .store
        .set("b", "https://b.example/", "user1")
        .await
        .unwrap();
    fixture
        .store
        .delete_user_urls("user1", &ids(&["a"]))
        .await
        .unwrap();

    let owned = fixture.store.urls_by_owner("user1").await.unwrap();

    assert_eq!(owned.len(), 1);
    assert_eq!(owned["b"], "https://b.example/");
    assert!(fixture.store.urls_by_owner("").await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_dedups_against_table_and_itself() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("old", "https://existing.example/", "user1")
        .await
        .unwrap();

    let items = vec![
        BatchItem::new("a", "https://go.dev/", "user1"),
        BatchItem::new("b", "https://go.dev/", "user1"),
        BatchItem::new("c", "https://existing.example/", "user1"),
        BatchItem::new("d", "https://rust-lang.org/", "user1"),
    ];
    let assigned = fixture.store.save_batch(&items).await.unwrap();

    assert_eq!(assigned.len(), 3);
    assert_eq!(assigned["https://go.dev/"], "a");
    assert_eq!(assigned["https://existing.example/"], "old");
    assert_eq!(assigned["https://rust-lang.org/"], "d");
    assert!(fixture.row("b").await.is_none());
    assert!(fixture.row("c").await.is_none());
}

#[tokio::test]
async fn failed_batch_rolls_back() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };

    let items = vec![
        BatchItem::new("a", "https://go.dev/", "user1"),
        BatchItem::new("b", "https://example.com/", ""),
    ];
    let err = fixture.store.save_batch(&items).await.unwrap_err();

    assert!(matches!(err, StoreError::Constraint(_)));
    assert!(fixture.row("a").await.is_none());
}

#[tokio::test]
async fn schema_creation_is_idempotent() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();

    let again = PostgresStore::new(fixture.pool.clone(), QUERY_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(again.get("foo").await.unwrap(), "https://go.dev/");
    again.ping().await.unwrap();
}

#[tokio::test]
async fn cleanup_truncates_table() {
    let Some(fixture) = Fixture::start().await else {
        return;
    };
    fixture
        .store
        .set("foo", "https://go.dev/", "user1")
        .await
        .unwrap();

    fixture.store.cleanup().await.unwrap();

    assert_eq!(
        fixture.store.get("foo").await.unwrap_err(),
        StoreError::UrlNotFound("foo".to_string())
    );
}
