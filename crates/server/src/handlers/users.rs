//! User profile endpoints.

use crate::auth::require_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{read_json, require_non_empty, store_error};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shelfwise_core::{normalize_email, normalize_username};
use shelfwise_metadata::models::{UserProfileUpdate, UserRow, db_now};
use time::OffsetDateTime;

/// Body for `POST /v1/me`.
#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

impl CreateProfileRequest {
    /// Validate into a row for `user_id`.
    pub fn into_row(self, user_id: &str) -> ApiResult<UserRow> {
        Ok(UserRow {
            user_id: user_id.to_string(),
            username: normalize_username(&self.username)?,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: normalize_email(&self.email)?,
            profile_photo_url: photo_url(self.profile_photo_url),
            created_at: db_now(),
        })
    }
}

/// Body for `PATCH /v1/me`. Absent fields are left alone; an empty
/// `profile_photo_url` clears the photo.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_update(self) -> ApiResult<UserProfileUpdate> {
        let update = UserProfileUpdate {
            username: self.username.as_deref().map(normalize_username).transpose()?,
            first_name: self.first_name.map(|s| s.trim().to_string()),
            last_name: self.last_name.map(|s| s.trim().to_string()),
            email: self.email.as_deref().map(normalize_email).transpose()?,
            profile_photo_url: self.profile_photo_url.map(|url| photo_url(Some(url))),
        };
        if update.is_empty() {
            return Err(ApiError::BadRequest("no profile fields to update".to_string()));
        }
        Ok(update)
    }
}

fn photo_url(raw: Option<String>) -> Option<String> {
    raw.map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Profile visible to any authenticated caller.
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo_url: Option<String>,
}

impl From<UserRow> for PublicProfileResponse {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_photo_url: row.profile_photo_url,
        }
    }
}

/// The caller's own profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: PublicProfileResponse,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for MeResponse {
    fn from(row: UserRow) -> Self {
        let email = row.email.clone();
        let created_at = row.created_at;
        Self {
            profile: row.into(),
            email,
            created_at,
        }
    }
}

/// GET /v1/users/{user_id} - Public profile of any user.
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    req: Request,
) -> ApiResult<Json<PublicProfileResponse>> {
    require_user(&req)?;
    require_non_empty("user_id", &user_id)?;

    let row = state
        .metadata
        .get_user(&user_id)
        .await
        .map_err(store_error("get_user", &user_id, &user_id))?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    Ok(Json(row.into()))
}

/// GET /v1/me - The authenticated caller's profile.
pub async fn get_me(State(state): State<AppState>, req: Request) -> ApiResult<Json<MeResponse>> {
    let auth = require_user(&req)?;

    let row = state
        .metadata
        .get_user(&auth.user_id)
        .await
        .map_err(store_error("get_user", &auth.user_id, &auth.user_id))?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", auth.user_id)))?;

    Ok(Json(row.into()))
}

/// POST /v1/me - Create the caller's profile and default shelf.
pub async fn create_me(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<MeResponse>)> {
    let user_id = require_user(&req)?.user_id.clone();
    let body: CreateProfileRequest = read_json(req).await?;
    let row = body.into_row(&user_id)?;

    let shelf = state
        .metadata
        .create_user(&row)
        .await
        .map_err(store_error("create_user", &user_id, &row.username))?;

    metrics::PROFILE_CHANGES.with_label_values(&["create"]).inc();
    tracing::info!(
        user_id = %user_id,
        default_shelf_id = %shelf.shelf_id,
        "profile created"
    );
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PATCH /v1/me - Change some of the caller's profile fields.
pub async fn update_me(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<MeResponse>> {
    let user_id = require_user(&req)?.user_id.clone();
    let body: UpdateProfileRequest = read_json(req).await?;
    let update = body.into_update()?;

    let row = state
        .metadata
        .update_user(&user_id, &update)
        .await
        .map_err(store_error("update_user", &user_id, &user_id))?;

    metrics::PROFILE_CHANGES.with_label_values(&["update"]).inc();
    tracing::info!(user_id = %user_id, "profile updated");
    Ok(Json(row.into()))
}

/// DELETE /v1/me - Delete the caller's profile, shelves and library.
///
/// The caller's tokens stay valid, so a new profile can be created.
pub async fn delete_me(State(state): State<AppState>, req: Request) -> ApiResult<StatusCode> {
    let user_id = require_user(&req)?.user_id.clone();

    state
        .metadata
        .delete_user(&user_id)
        .await
        .map_err(store_error("delete_user", &user_id, &user_id))?;

    metrics::PROFILE_CHANGES.with_label_values(&["delete"]).inc();
    tracing::info!(user_id = %user_id, "profile deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateProfileRequest {
        CreateProfileRequest {
            username: " ada ".to_string(),
            first_name: "Ada ".to_string(),
            last_name: " Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            profile_photo_url: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_into_row_normalizes() {
        let row = create_request().into_row("u1").unwrap();
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.username, "ada");
        assert_eq!((row.first_name.as_str(), row.last_name.as_str()), ("Ada", "Lovelace"));
        assert!(row.profile_photo_url.is_none());
    }

    #[test]
    fn test_into_row_rejects_short_username_and_bad_email() {
        let mut req = create_request();
        req.username = "ab".to_string();
        assert_eq!(req.into_row("u1").unwrap_err().code(), "bad_request");

        let mut req = create_request();
        req.email = "not-an-email".to_string();
        assert_eq!(req.into_row("u1").unwrap_err().code(), "bad_request");
    }

    #[test]
    fn test_into_update() {
        let update = UpdateProfileRequest {
            username: None,
            first_name: Some(" Augusta ".to_string()),
            last_name: None,
            email: None,
            profile_photo_url: Some(String::new()),
        }
        .into_update()
        .unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Augusta"));
        assert_eq!(update.profile_photo_url, Some(None));
        assert!(update.username.is_none());

        let empty = UpdateProfileRequest {
            username: None,
            first_name: None,
            last_name: None,
            email: None,
            profile_photo_url: None,
        };
        assert_eq!(empty.into_update().unwrap_err().code(), "bad_request");
    }
}
