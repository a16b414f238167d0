//! Shared handler helpers.

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shelfwise_core::PageRequest;
use shelfwise_metadata::MetadataError;
use std::fmt::Display;
use uuid::Uuid;

/// Maximum JSON body size accepted by the API.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Map a store error for `operation` on `entity` owned by `owner`.
///
/// Domain errors pass through untouched. Anything else is logged with the
/// operation, owner and entity, and counted; the client only sees an opaque
/// internal error.
pub fn store_error<'a>(
    operation: &'static str,
    owner: &'a str,
    entity: impl Display + 'a,
) -> impl FnOnce(MetadataError) -> ApiError + 'a {
    move |e| {
        if !e.is_domain() {
            crate::metrics::record_store_error(operation);
            tracing::error!(
                operation,
                owner,
                entity = %entity,
                error = %e,
                "metadata store failure"
            );
        }
        ApiError::Metadata(e)
    }
}

/// Read and decode a JSON request body.
pub async fn read_json<T: DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Parse a shelf id from a path segment or body field.
pub fn parse_shelf_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid shelf_id: {raw}")))
}

/// Trim a book id from a path segment, rejecting a blank one.
pub fn parse_book_id(raw: &str) -> ApiResult<String> {
    require_non_empty("book_id", raw)?;
    Ok(raw.trim().to_string())
}

/// Reject an empty (after trimming) path or body identifier.
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// Only the owner may read their shelves and library.
pub fn ensure_self(auth: &AuthenticatedUser, user_id: &str) -> ApiResult<()> {
    if auth.user_id != user_id {
        return Err(ApiError::PermissionDenied(
            "cannot view another user's library".to_string(),
        ));
    }
    Ok(())
}

/// Raw `page` / `limit` query parameters.
///
/// Kept as strings so malformed numbers surface as our own `bad_request`
/// body rather than the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn to_request(&self) -> ApiResult<PageRequest> {
        let page = parse_u32("page", self.page.as_deref())?;
        let limit = parse_u32("limit", self.limit.as_deref())?;
        Ok(PageRequest::new(page, limit)?)
    }
}

fn parse_u32(field: &str, raw: Option<&str>) -> ApiResult<Option<u32>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{field} must be a positive integer"))),
    }
}
