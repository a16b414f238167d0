//! API token repository.

use crate::error::MetadataResult;
use crate::models::ApiTokenRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for hashed bearer tokens.
#[async_trait]
pub trait TokenRepo: Send + Sync {
    /// Create a token. Fails with `AlreadyExists` if the hash is already registered.
    async fn create_token(&self, token: &ApiTokenRow) -> MetadataResult<()>;

    /// Get a token by hash.
    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<ApiTokenRow>>;

    /// Update last used time.
    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()>;

    /// Revoke a token.
    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()>;
}
