//! Authentication middleware and caller identity.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::store_error;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use shelfwise_metadata::models::db_now;
use shelfwise_metadata::{MetadataResult, MetadataStore};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Request and response header carrying the trace ID.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// Truncated to MAX_TRACE_ID_LEN characters, non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bearer token resolved to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedToken {
    pub token_id: Uuid,
    pub user_id: String,
}

/// Turns a raw bearer token into a user identity.
///
/// `Ok(None)` means the token is unknown or revoked; errors are reserved for
/// the verifier itself failing.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> MetadataResult<Option<VerifiedToken>>;
}

/// Verifier backed by the hashed tokens in the metadata store.
pub struct StoredTokenVerifier {
    metadata: Arc<dyn MetadataStore>,
}

impl StoredTokenVerifier {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl TokenVerifier for StoredTokenVerifier {
    async fn verify(&self, token: &str) -> MetadataResult<Option<VerifiedToken>> {
        let Some(row) = self.metadata.get_token_by_hash(&hash_token(token)).await? else {
            return Ok(None);
        };
        if row.revoked_at.is_some() {
            tracing::debug!(token_id = %row.token_id, "rejecting revoked token");
            return Ok(None);
        }

        // Update last used time (fire and forget)
        let metadata = self.metadata.clone();
        let token_id = row.token_id;
        tokio::spawn(async move {
            if let Err(e) = metadata
                .touch_token(token_id, db_now())
                .await
            {
                tracing::debug!(token_id = %token_id, error = %e, "failed to record token use");
            }
        });

        Ok(Some(VerifiedToken {
            token_id: row.token_id,
            user_id: row.user_id,
        }))
    }
}

/// Authenticated request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub token_id: Uuid,
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(v[7..].trim())
            } else {
                None
            }
        })
        .filter(|t| !t.is_empty())
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Lowercase SHA-256 hex of a raw token, as stored in `api_tokens`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Authentication middleware that resolves the caller and sets up trace context.
///
/// The trace ID is echoed back in the `x-trace-id` response header.
///
/// Requests without a valid token pass through unauthenticated; handlers
/// decide whether they need a user via [`require_user`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let span = tracing::info_span!("request", trace_id = %trace_id);

    let verified = match extract_bearer_token(&req) {
        Some(token) => state
            .verifier
            .verify(token)
            .instrument(span.clone())
            .await
            .map_err(store_error("verify_token", "-", "-"))?,
        None => None,
    };

    if let Some(verified) = verified {
        req.extensions_mut().insert(AuthenticatedUser {
            user_id: verified.user_id,
            token_id: verified.token_id,
        });
    }

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    Ok(response)
}

/// The authenticated caller's user id, or `Unauthenticated`.
pub fn require_user(req: &Request) -> ApiResult<&AuthenticatedUser> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthenticated("authentication required".to_string()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
