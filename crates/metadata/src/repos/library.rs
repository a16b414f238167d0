//! Library repository: books in a user's library and their shelf assignments.

use crate::error::MetadataResult;
use crate::models::{LibraryBook, LibraryBookInput};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for library books and shelf assignments.
#[async_trait]
pub trait LibraryRepo: Send + Sync {
    /// Insert or update a book and replace its shelf assignments, atomically.
    ///
    /// `added_at` is set on first insert and preserved afterwards; `updated_at`
    /// is refreshed on every call. `shelf_ids` is the complete desired set:
    /// existing assignments not in it are removed. If any id is not one of
    /// the owner's shelves nothing is written and `ShelfNotFound` is returned.
    async fn upsert_library_book(
        &self,
        owner_id: &str,
        book: &LibraryBookInput,
        shelf_ids: &[Uuid],
    ) -> MetadataResult<()>;

    /// Get a single library book with its shelf ids.
    async fn get_library_book(
        &self,
        owner_id: &str,
        book_id: &str,
    ) -> MetadataResult<Option<LibraryBook>>;

    /// Remove a book (and its assignments). Fails with `NotFound` if absent.
    async fn remove_library_book(&self, owner_id: &str, book_id: &str) -> MetadataResult<()>;

    /// Assign a book to a shelf. Idempotent.
    ///
    /// Fails with `BookNotFound` or `ShelfNotFound` without writing anything.
    async fn add_book_to_shelf(
        &self,
        owner_id: &str,
        book_id: &str,
        shelf_id: Uuid,
    ) -> MetadataResult<()>;

    /// Remove a single assignment. Absence is not an error.
    async fn remove_book_from_shelf(
        &self,
        owner_id: &str,
        book_id: &str,
        shelf_id: Uuid,
    ) -> MetadataResult<()>;

    /// Every book in the owner's library, newest first, each with all its shelf ids.
    async fn list_library(&self, owner_id: &str) -> MetadataResult<Vec<LibraryBook>>;

    /// Books assigned to one shelf, newest first. Each book still carries its
    /// complete shelf-id set, not just `shelf_id`.
    async fn list_shelf_books(
        &self,
        owner_id: &str,
        shelf_id: Uuid,
    ) -> MetadataResult<Vec<LibraryBook>>;
}
