//! Metadata store test utilities.

use shelfwise_metadata::{
    MetadataError, MetadataResult, MetadataStore, PostgresStore, SqliteStore,
};
use sqlx::{Pool, Postgres as SqlxPostgres, Sqlite};
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// Marker on errors caused by Docker being unavailable rather than by the store.
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

/// Library store on a SQLite file that lives as long as this value.
#[allow(dead_code)]
pub struct TestMetadata {
    sqlite: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir()?;
        let sqlite = SqliteStore::new(temp_dir.path().join("library.db"), None).await?;
        Ok(Self {
            sqlite: Arc::new(sqlite),
            _temp_dir: temp_dir,
        })
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.sqlite.clone()
    }

    /// Raw pool, for poking at constraints the store API never violates.
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite.pool()
    }
}

/// Library store on a throwaway PostgreSQL container.
#[allow(dead_code)]
pub struct PostgresTestMetadata {
    postgres: Arc<PostgresStore>,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl PostgresTestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| container_error("start", e))?;
        let host = container
            .get_host()
            .await
            .map_err(|e| container_error("resolve host", e))?;
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .map_err(|e| container_error("resolve port", e))?;

        // testcontainers-modules default credentials
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
        let postgres = PostgresStore::from_url(&url, 5, Some(10_000)).await?;

        Ok(Self {
            postgres: Arc::new(postgres),
            _container: container,
        })
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.postgres.clone()
    }

    pub fn pool(&self) -> &Pool<SqlxPostgres> {
        self.postgres.pool()
    }
}

fn container_error(step: &str, err: impl std::fmt::Display) -> MetadataError {
    MetadataError::Internal(format!(
        "{POSTGRES_CONTAINER_START_ERR_PREFIX} failed to {step} PostgreSQL container: {err}"
    ))
}

/// Start a PostgreSQL test store, or `None` when Docker is unavailable or
/// `SKIP_POSTGRES_TESTS` is set. Any other setup failure panics.
#[allow(dead_code)]
pub async fn postgres_or_skip() -> Option<PostgresTestMetadata> {
    if std::env::var("SKIP_POSTGRES_TESTS").is_ok() {
        eprintln!("Skipping PostgreSQL tests: SKIP_POSTGRES_TESTS is set");
        return None;
    }
    match PostgresTestMetadata::new().await {
        Ok(postgres) => Some(postgres),
        Err(err) if err.to_string().contains(POSTGRES_CONTAINER_START_ERR_PREFIX) => {
            eprintln!("Skipping PostgreSQL tests: {err}");
            None
        }
        Err(err) => panic!("PostgreSQL test setup failed: {err}"),
    }
}

/// Run `test_fn` against a fresh SQLite store, then a fresh PostgreSQL store
/// when one is available.
#[allow(dead_code)]
pub async fn run_metadata_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<dyn MetadataStore>) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestMetadata::new()
        .await
        .expect("Failed to create SQLite test metadata");
    test_fn.clone()(sqlite.store()).await;

    if let Some(postgres) = postgres_or_skip().await {
        test_fn(postgres.store()).await;
    }
}
