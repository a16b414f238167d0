//! Database models mapping to the library schema.

use crate::error::MetadataResult;
use shelfwise_core::{BookRating, BookSource, ReadingStatus};
use sqlx::FromRow;
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// Current time truncated to microseconds, the precision PostgreSQL keeps.
/// Both backends then hand back exactly the value that was written.
pub fn db_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let micros = now.nanosecond() / 1_000;
    now.replace_nanosecond(micros * 1_000).unwrap_or(now)
}

// =============================================================================
// Users and tokens
// =============================================================================

/// User profile. The id comes from the caller's token; the rest is
/// self-managed through the profile endpoints.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_photo_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Partial profile change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the photo.
    pub profile_photo_url: Option<Option<String>>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Hashed bearer token owned by a user.
#[derive(Debug, Clone, FromRow)]
pub struct ApiTokenRow {
    pub token_id: Uuid,
    pub user_id: String,
    /// Lowercase SHA-256 hex of the raw token.
    pub token_hash: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
}

// =============================================================================
// Shelves
// =============================================================================

/// Shelf record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ShelfRow {
    pub shelf_id: Uuid,
    pub owner_id: String,
    pub shelf_name: String,
    /// Bootstrap shelf; never renamed or deleted.
    pub is_default: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// Library books
// =============================================================================

/// Raw library book record as stored.
#[derive(Debug, Clone, FromRow)]
pub struct LibraryBookRow {
    pub owner_id: String,
    pub book_id: String,
    pub title: String,
    pub author_name: String,
    pub book_image: Option<String>,
    pub rating: i32,
    pub source: i32,
    pub reading_status: i32,
    pub added_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Shelf assignment link as read back for aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct ShelfLinkRow {
    pub book_id: String,
    pub shelf_id: Uuid,
}

/// Mutable book metadata supplied on upsert.
#[derive(Debug, Clone)]
pub struct LibraryBookInput {
    pub book_id: String,
    pub title: String,
    pub author_name: String,
    pub book_image: Option<String>,
    pub rating: BookRating,
    pub source: BookSource,
    pub reading_status: ReadingStatus,
}

/// A library book together with every shelf it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryBook {
    pub owner_id: String,
    pub book_id: String,
    pub title: String,
    pub author_name: String,
    pub book_image: Option<String>,
    pub rating: BookRating,
    pub source: BookSource,
    pub reading_status: ReadingStatus,
    pub shelf_ids: Vec<Uuid>,
    pub added_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl LibraryBook {
    /// Decode a stored row, attaching its shelf ids.
    pub fn from_row(row: LibraryBookRow, shelf_ids: Vec<Uuid>) -> MetadataResult<Self> {
        Ok(Self {
            rating: BookRating::new(row.rating.into())?,
            source: BookSource::from_code(row.source)?,
            reading_status: ReadingStatus::from_code(row.reading_status)?,
            owner_id: row.owner_id,
            book_id: row.book_id,
            title: row.title,
            author_name: row.author_name,
            book_image: row.book_image,
            shelf_ids,
            added_at: row.added_at,
            updated_at: row.updated_at,
        })
    }

    pub fn is_unshelved(&self) -> bool {
        self.shelf_ids.is_empty()
    }
}

/// Attach shelf ids to book rows, preserving the order of `rows`.
///
/// `links` may be in any order; each book's ids keep the relative order they
/// have in `links`.
pub fn attach_shelf_ids(
    rows: Vec<LibraryBookRow>,
    links: Vec<ShelfLinkRow>,
) -> MetadataResult<Vec<LibraryBook>> {
    let mut by_book: HashMap<String, Vec<Uuid>> = HashMap::new();
    for link in links {
        by_book.entry(link.book_id).or_default().push(link.shelf_id);
    }

    rows.into_iter()
        .map(|row| {
            let shelf_ids = by_book.remove(&row.book_id).unwrap_or_default();
            LibraryBook::from_row(row, shelf_ids)
        })
        .collect()
}

/// Drop repeated ids, keeping first occurrence order.
pub fn dedup_shelf_ids(shelf_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(shelf_ids.len());
    shelf_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
