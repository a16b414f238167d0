//! Shelf repository.
//!
//! Every query is scoped by owner. A shelf id that exists but belongs to
//! somebody else is reported exactly like a missing one.

use crate::error::MetadataResult;
use crate::models::ShelfRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for user shelves.
#[async_trait]
pub trait ShelfRepo: Send + Sync {
    /// Create a non-default shelf with a fresh id.
    ///
    /// Fails with `DuplicateName` if the owner already has a shelf by that name.
    async fn create_shelf(&self, owner_id: &str, name: &str) -> MetadataResult<ShelfRow>;

    /// Get one of the owner's shelves.
    async fn get_shelf(&self, owner_id: &str, shelf_id: Uuid) -> MetadataResult<Option<ShelfRow>>;

    /// Rename a shelf and return the updated row.
    ///
    /// Fails with `NotFound`, `DefaultShelfProtected` or `DuplicateName`.
    async fn update_shelf(
        &self,
        owner_id: &str,
        shelf_id: Uuid,
        name: &str,
    ) -> MetadataResult<ShelfRow>;

    /// Delete a shelf and every assignment to it. Books stay in the library.
    ///
    /// Fails with `NotFound` or `DefaultShelfProtected`.
    async fn delete_shelf(&self, owner_id: &str, shelf_id: Uuid) -> MetadataResult<()>;

    /// List the owner's shelves: default shelf first, then oldest first.
    async fn list_shelves(&self, owner_id: &str) -> MetadataResult<Vec<ShelfRow>>;
}
