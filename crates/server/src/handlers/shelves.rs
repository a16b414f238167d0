//! Shelf endpoints.

use crate::auth::require_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{
    PageParams, ensure_self, parse_shelf_id, read_json, require_non_empty, store_error,
};
use crate::handlers::library::LibraryBookResponse;
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shelfwise_core::{PaginationMetadata, normalize_shelf_name};
use shelfwise_metadata::models::ShelfRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Body for creating or renaming a shelf.
#[derive(Debug, Deserialize)]
pub struct ShelfNameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ShelfResponse {
    pub shelf_id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub is_default: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ShelfRow> for ShelfResponse {
    fn from(row: ShelfRow) -> Self {
        Self {
            shelf_id: row.shelf_id,
            owner_id: row.owner_id,
            name: row.shelf_name,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListShelvesResponse {
    pub shelves: Vec<ShelfResponse>,
}

#[derive(Debug, Serialize)]
pub struct ShelfBooksResponse {
    pub shelf: ShelfResponse,
    pub books: Vec<LibraryBookResponse>,
    pub pagination: PaginationMetadata,
}

/// POST /v1/shelves - Create a shelf for the caller.
pub async fn create_shelf(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<ShelfResponse>)> {
    let owner = require_user(&req)?.user_id.clone();
    let body: ShelfNameRequest = read_json(req).await?;
    let name = normalize_shelf_name(&body.name)?;

    let shelf = state
        .metadata
        .create_shelf(&owner, &name)
        .await
        .map_err(store_error("create_shelf", &owner, &name))?;

    metrics::SHELVES_CREATED.inc();
    tracing::info!(owner = %owner, shelf_id = %shelf.shelf_id, "shelf created");

    Ok((StatusCode::CREATED, Json(shelf.into())))
}

/// PUT /v1/shelves/{shelf_id} - Rename one of the caller's shelves.
pub async fn update_shelf(
    State(state): State<AppState>,
    Path(shelf_id): Path<String>,
    req: Request,
) -> ApiResult<Json<ShelfResponse>> {
    let owner = require_user(&req)?.user_id.clone();
    let shelf_id = parse_shelf_id(&shelf_id)?;
    let body: ShelfNameRequest = read_json(req).await?;
    let name = normalize_shelf_name(&body.name)?;

    let shelf = state
        .metadata
        .update_shelf(&owner, shelf_id, &name)
        .await
        .map_err(store_error("update_shelf", &owner, shelf_id))?;

    tracing::info!(owner = %owner, shelf_id = %shelf_id, "shelf renamed");
    Ok(Json(shelf.into()))
}

/// DELETE /v1/shelves/{shelf_id} - Delete one of the caller's shelves.
///
/// Books stay in the library; only their assignment to this shelf goes.
pub async fn delete_shelf(
    State(state): State<AppState>,
    Path(shelf_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_user(&req)?.user_id.clone();
    let shelf_id = parse_shelf_id(&shelf_id)?;

    state
        .metadata
        .delete_shelf(&owner, shelf_id)
        .await
        .map_err(store_error("delete_shelf", &owner, shelf_id))?;

    metrics::SHELVES_DELETED.inc();
    tracing::info!(owner = %owner, shelf_id = %shelf_id, "shelf deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/{user_id}/shelves - The caller's shelves, default first.
pub async fn list_shelves(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    req: Request,
) -> ApiResult<Json<ListShelvesResponse>> {
    let auth = require_user(&req)?;
    require_non_empty("user_id", &user_id)?;
    ensure_self(auth, &user_id)?;

    let shelves = state
        .metadata
        .list_shelves(&user_id)
        .await
        .map_err(store_error("list_shelves", &user_id, "-"))?;

    Ok(Json(ListShelvesResponse {
        shelves: shelves.into_iter().map(ShelfResponse::from).collect(),
    }))
}

/// GET /v1/shelves/{shelf_id}/books - Books on one of the caller's shelves.
pub async fn get_shelf_books(
    State(state): State<AppState>,
    Path(shelf_id): Path<String>,
    Query(params): Query<PageParams>,
    req: Request,
) -> ApiResult<Json<ShelfBooksResponse>> {
    let owner = require_user(&req)?.user_id.clone();
    let shelf_id = parse_shelf_id(&shelf_id)?;
    let page = params.to_request()?;

    let shelf = state
        .metadata
        .get_shelf(&owner, shelf_id)
        .await
        .map_err(store_error("get_shelf", &owner, shelf_id))?
        .ok_or_else(|| ApiError::NotFound(format!("shelf {shelf_id} not found")))?;

    let books = state
        .metadata
        .list_shelf_books(&owner, shelf_id)
        .await
        .map_err(store_error("list_shelf_books", &owner, shelf_id))?;

    Ok(Json(ShelfBooksResponse {
        shelf: shelf.into(),
        pagination: PaginationMetadata::new(books.len(), page),
        books: books.into_iter().map(LibraryBookResponse::from).collect(),
    }))
}
