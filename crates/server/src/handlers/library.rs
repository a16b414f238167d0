//! Library endpoints: books, their shelf assignments, and the grouped view.

use crate::auth::require_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{
    PageParams, ensure_self, parse_book_id, parse_shelf_id, read_json, require_non_empty,
    store_error,
};
use crate::handlers::shelves::ShelfResponse;
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shelfwise_core::{BookRating, BookSource, PaginationMetadata, ReadingStatus};
use shelfwise_metadata::models::{LibraryBook, LibraryBookInput};
use shelfwise_metadata::{UserLibrary, get_user_library};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Body for `PUT /v1/library/books/{book_id}`.
///
/// `shelf_ids` is the complete set of shelves the book should be on.
#[derive(Debug, Deserialize)]
pub struct UpsertLibraryBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub book_image: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reading_status: Option<String>,
    #[serde(default)]
    pub shelf_ids: Vec<String>,
}

impl UpsertLibraryBookRequest {
    /// Validate into store input plus the parsed shelf ids.
    pub fn into_input(self, book_id: &str) -> ApiResult<(LibraryBookInput, Vec<Uuid>)> {
        let book_id = parse_book_id(book_id)?;
        require_non_empty("title", &self.title)?;
        require_non_empty("author_name", &self.author_name)?;

        let rating = match self.rating {
            Some(r) => BookRating::new(r)?,
            None => BookRating::UNSPECIFIED,
        };
        let source = match self.source.as_deref() {
            Some(s) => BookSource::parse(s)?,
            None => BookSource::Unspecified,
        };
        let reading_status = match self.reading_status.as_deref() {
            Some(s) => ReadingStatus::parse(s)?,
            None => ReadingStatus::Unspecified,
        };
        if reading_status == ReadingStatus::Unspecified {
            return Err(ApiError::BadRequest(
                "reading_status must be specified".to_string(),
            ));
        }

        let shelf_ids = self
            .shelf_ids
            .iter()
            .map(|id| parse_shelf_id(id))
            .collect::<ApiResult<Vec<_>>>()?;

        let input = LibraryBookInput {
            book_id,
            title: self.title.trim().to_string(),
            author_name: self.author_name.trim().to_string(),
            book_image: self.book_image.filter(|url| !url.trim().is_empty()),
            rating,
            source,
            reading_status,
        };
        Ok((input, shelf_ids))
    }
}

#[derive(Debug, Serialize)]
pub struct LibraryBookResponse {
    pub book_id: String,
    pub title: String,
    pub author_name: String,
    pub book_image: Option<String>,
    pub rating: BookRating,
    pub source: BookSource,
    pub reading_status: ReadingStatus,
    pub shelf_ids: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<LibraryBook> for LibraryBookResponse {
    fn from(book: LibraryBook) -> Self {
        Self {
            book_id: book.book_id,
            title: book.title,
            author_name: book.author_name,
            book_image: book.book_image,
            rating: book.rating,
            source: book.source,
            reading_status: book.reading_status,
            shelf_ids: book.shelf_ids,
            added_at: book.added_at,
            updated_at: book.updated_at,
        }
    }
}

impl From<&Arc<LibraryBook>> for LibraryBookResponse {
    fn from(book: &Arc<LibraryBook>) -> Self {
        LibraryBook::clone(book).into()
    }
}

#[derive(Debug, Serialize)]
pub struct ShelfWithBooksResponse {
    pub shelf: ShelfResponse,
    pub books: Vec<LibraryBookResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserLibraryResponse {
    pub shelves: Vec<ShelfWithBooksResponse>,
    pub unshelved: Vec<LibraryBookResponse>,
    pub pagination: PaginationMetadata,
}

impl From<UserLibrary> for UserLibraryResponse {
    fn from(library: UserLibrary) -> Self {
        Self {
            shelves: library
                .shelves
                .into_iter()
                .map(|entry| ShelfWithBooksResponse {
                    shelf: entry.shelf.into(),
                    books: entry.books.iter().map(LibraryBookResponse::from).collect(),
                })
                .collect(),
            unshelved: library
                .unshelved
                .iter()
                .map(LibraryBookResponse::from)
                .collect(),
            pagination: library.pagination,
        }
    }
}

/// PUT /v1/library/books/{book_id} - Add or update a book and replace its shelves.
pub async fn upsert_library_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    req: Request,
) -> ApiResult<Json<LibraryBookResponse>> {
    let owner = require_user(&req)?.user_id.clone();
    let body: UpsertLibraryBookRequest = read_json(req).await?;
    let (input, shelf_ids) = body.into_input(&book_id)?;
    let book_id = input.book_id.clone();

    state
        .metadata
        .upsert_library_book(&owner, &input, &shelf_ids)
        .await
        .map_err(store_error("upsert_library_book", &owner, &book_id))?;

    metrics::LIBRARY_UPSERTS.inc();
    tracing::info!(
        owner = %owner,
        book_id = %book_id,
        shelves = shelf_ids.len(),
        "library book upserted"
    );

    // A concurrent removal can land between the upsert and this read.
    let stored = state
        .metadata
        .get_library_book(&owner, &book_id)
        .await
        .map_err(store_error("get_library_book", &owner, &book_id))?
        .ok_or_else(|| ApiError::NotFound(format!("book {book_id} not found in library")))?;

    Ok(Json(stored.into()))
}

/// DELETE /v1/library/books/{book_id} - Remove a book from the caller's library.
pub async fn remove_library_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_user(&req)?.user_id.clone();
    let book_id = parse_book_id(&book_id)?;

    state
        .metadata
        .remove_library_book(&owner, &book_id)
        .await
        .map_err(store_error("remove_library_book", &owner, &book_id))?;

    tracing::info!(owner = %owner, book_id = %book_id, "library book removed");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/library/books/{book_id}/shelves/{shelf_id} - Put a book on one more shelf.
pub async fn add_book_to_shelf(
    State(state): State<AppState>,
    Path((book_id, shelf_id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_user(&req)?.user_id.clone();
    let book_id = parse_book_id(&book_id)?;
    let shelf_id = parse_shelf_id(&shelf_id)?;

    state
        .metadata
        .add_book_to_shelf(&owner, &book_id, shelf_id)
        .await
        .map_err(store_error("add_book_to_shelf", &owner, &book_id))?;

    metrics::SHELF_ASSIGNMENT_CHANGES
        .with_label_values(&["add"])
        .inc();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/library/books/{book_id}/shelves/{shelf_id} - Take a book off one shelf.
pub async fn remove_book_from_shelf(
    State(state): State<AppState>,
    Path((book_id, shelf_id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_user(&req)?.user_id.clone();
    let book_id = parse_book_id(&book_id)?;
    let shelf_id = parse_shelf_id(&shelf_id)?;

    state
        .metadata
        .remove_book_from_shelf(&owner, &book_id, shelf_id)
        .await
        .map_err(store_error("remove_book_from_shelf", &owner, &book_id))?;

    metrics::SHELF_ASSIGNMENT_CHANGES
        .with_label_values(&["remove"])
        .inc();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/{user_id}/library - The caller's library grouped by shelf.
pub async fn get_user_library_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
    req: Request,
) -> ApiResult<Json<UserLibraryResponse>> {
    let auth = require_user(&req)?;
    require_non_empty("user_id", &user_id)?;
    ensure_self(auth, &user_id)?;
    let page = params.to_request()?;

    let timer = metrics::LIBRARY_ASSEMBLY_DURATION.start_timer();
    let library = get_user_library(state.metadata.as_ref(), &user_id, page)
        .await
        .map_err(store_error("get_user_library", &user_id, "-"))?;
    timer.observe_duration();

    tracing::debug!(
        owner = %user_id,
        shelves = library.shelves.len(),
        unshelved = library.unshelved.len(),
        total = library.pagination.total,
        "library assembled"
    );

    Ok(Json(library.into()))
}
