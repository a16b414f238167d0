//! Shelf-grouped view of a user's library.

use crate::error::MetadataResult;
use crate::models::{LibraryBook, ShelfRow};
use crate::store::MetadataStore;
use shelfwise_core::{PageRequest, PaginationMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A shelf together with the books assigned to it.
#[derive(Debug, Clone)]
pub struct ShelfWithBooks {
    pub shelf: ShelfRow,
    pub books: Vec<Arc<LibraryBook>>,
}

/// A user's library grouped by shelf.
///
/// A book on several shelves appears under each of them (the same `Arc`);
/// a book on none appears only in `unshelved`.
#[derive(Debug, Clone)]
pub struct UserLibrary {
    pub shelves: Vec<ShelfWithBooks>,
    pub unshelved: Vec<Arc<LibraryBook>>,
    pub pagination: PaginationMetadata,
}

/// Group `books` under `shelves`.
///
/// Shelf order follows `shelves`; book order within a bucket follows
/// `books`. Shelf ids that are not in `shelves` are skipped.
pub fn assemble_library(
    shelves: Vec<ShelfRow>,
    books: Vec<LibraryBook>,
    page: PageRequest,
) -> UserLibrary {
    let total = books.len();

    let mut buckets: HashMap<Uuid, Vec<Arc<LibraryBook>>> = shelves
        .iter()
        .map(|shelf| (shelf.shelf_id, Vec::new()))
        .collect();
    let mut unshelved = Vec::new();

    for book in books {
        let book = Arc::new(book);
        if book.is_unshelved() {
            unshelved.push(book);
            continue;
        }
        for shelf_id in &book.shelf_ids {
            match buckets.get_mut(shelf_id) {
                Some(bucket) => bucket.push(Arc::clone(&book)),
                None => tracing::debug!(
                    book_id = %book.book_id,
                    shelf_id = %shelf_id,
                    "skipping assignment to unknown shelf"
                ),
            }
        }
    }

    let shelves = shelves
        .into_iter()
        .map(|shelf| {
            let books = buckets.remove(&shelf.shelf_id).unwrap_or_default();
            ShelfWithBooks { shelf, books }
        })
        .collect();

    UserLibrary {
        shelves,
        unshelved,
        pagination: PaginationMetadata::new(total, page),
    }
}

/// Fetch and assemble `owner_id`'s library.
pub async fn get_user_library(
    store: &dyn MetadataStore,
    owner_id: &str,
    page: PageRequest,
) -> MetadataResult<UserLibrary> {
    let shelves = store.list_shelves(owner_id).await?;
    let books = store.list_library(owner_id).await?;
    Ok(assemble_library(shelves, books, page))
}
