//! User repository.

use crate::error::MetadataResult;
use crate::models::{ShelfRow, UserProfileUpdate, UserRow};
use async_trait::async_trait;

/// Repository for user profiles.
///
/// Usernames and non-empty emails are unique. Clashes surface as
/// `AlreadyExists` naming the field.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user together with its default shelf, atomically.
    /// Returns the default shelf. Fails with `AlreadyExists` if the id,
    /// username or email is taken.
    async fn create_user(&self, user: &UserRow) -> MetadataResult<ShelfRow>;

    /// Get a user by ID.
    async fn get_user(&self, user_id: &str) -> MetadataResult<Option<UserRow>>;

    /// Apply the set fields of `update` and return the new row.
    ///
    /// Fails with `NotFound` or `AlreadyExists`.
    async fn update_user(
        &self,
        user_id: &str,
        update: &UserProfileUpdate,
    ) -> MetadataResult<UserRow>;

    /// Delete a profile with its shelves and library. Tokens are kept.
    ///
    /// Fails with `NotFound`.
    async fn delete_user(&self, user_id: &str) -> MetadataResult<()>;
}
