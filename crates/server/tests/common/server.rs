//! Server test utilities.

use crate::common::fixtures::{sha256_hash, test_user};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use shelfwise_core::config::{AppConfig, MetadataConfig};
use shelfwise_metadata::models::{ApiTokenRow, db_now};
use shelfwise_metadata::{MetadataStore, SqliteStore};
use shelfwise_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

/// A user provisioned for API tests.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub token: String,
    pub default_shelf_id: Uuid,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server on a temp-dir SQLite database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.metadata = MetadataConfig::Sqlite {
            path: db_path,
            query_timeout_secs: None,
        };
        modifier(&mut config);

        let state = AppState::new(config, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Create a user with a default shelf and a bearer token.
    pub async fn create_user(&self, prefix: &str) -> TestUser {
        let user = test_user(prefix);
        let shelf = self
            .metadata()
            .create_user(&user)
            .await
            .expect("Failed to create user");

        let token = self.create_token(&user.user_id).await;

        TestUser {
            user_id: user.user_id,
            token,
            default_shelf_id: shelf.shelf_id,
        }
    }

    /// Register a bearer token for `user_id`, whether or not it has a profile.
    pub async fn create_token(&self, user_id: &str) -> String {
        let token = format!("test-token-{}", Uuid::new_v4());
        let row = ApiTokenRow {
            token_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            token_hash: sha256_hash(token.as_bytes()),
            description: Some("Test Token".to_string()),
            created_at: db_now(),
            last_used_at: None,
            revoked_at: None,
        };
        self.metadata()
            .create_token(&row)
            .await
            .expect("Failed to create token");
        token
    }

    /// Send a request and decode the JSON response (`Null` for empty bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        auth_token: Option<&str>,
    ) -> (StatusCode, Value) {
        json_request(&self.router, method, uri, body, auth_token).await
    }
}

/// Helper to make JSON requests.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
