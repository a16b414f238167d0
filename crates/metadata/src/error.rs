//! Metadata store error types.

use thiserror::Error;
use uuid::Uuid;

/// Metadata store operation errors.
///
/// The first group are domain outcomes callers are expected to handle; the
/// rest are infrastructure failures.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("shelf name already exists: {0}")]
    DuplicateName(String),

    #[error("default shelf {0} cannot be modified")]
    DefaultShelfProtected(Uuid),

    #[error("book not found in library: {0}")]
    BookNotFound(String),

    #[error("shelf not found: {0}")]
    ShelfNotFound(Uuid),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MetadataError {
    /// Whether this is an expected domain outcome rather than a store failure.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::DuplicateName(_)
                | Self::DefaultShelfProtected(_)
                | Self::BookNotFound(_)
                | Self::ShelfNotFound(_)
                | Self::AlreadyExists(_)
        )
    }
}

impl From<shelfwise_core::Error> for MetadataError {
    fn from(e: shelfwise_core::Error) -> Self {
        // Core validation failing on stored data means the row is corrupt.
        MetadataError::Internal(format!("invalid stored value: {e}"))
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        MetadataError::Config(e.to_string())
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Whether a sqlx error is a unique-constraint violation (either backend).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Whether a sqlx error is a foreign-key violation (either backend).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Map a failed write keyed by `owner_id`. A foreign-key violation on the
/// owner means the caller has a token but no profile.
pub(crate) fn owner_write_error(err: sqlx::Error, owner_id: &str) -> MetadataError {
    if is_foreign_key_violation(&err) {
        MetadataError::NotFound(format!("user {owner_id} has no profile"))
    } else {
        err.into()
    }
}

/// Map a unique violation on `users` to the clashing field.
///
/// PostgreSQL reports the constraint name, SQLite only a message naming the
/// column; both mention it.
pub(crate) fn user_conflict(
    err: &sqlx::Error,
    user_id: &str,
    username: &str,
    email: &str,
) -> MetadataError {
    let detail = match err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .map(str::to_string)
            .unwrap_or_else(|| db_err.message().to_string()),
        _ => String::new(),
    };
    let what = if detail.contains("email") {
        format!("email '{email}' is already taken")
    } else if detail.contains("username") {
        format!("username '{username}' is already taken")
    } else {
        format!("user {user_id} already has a profile")
    };
    MetadataError::AlreadyExists(what)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_classification() {
        assert!(MetadataError::DuplicateName("a".to_string()).is_domain());
        assert!(MetadataError::ShelfNotFound(Uuid::nil()).is_domain());
        assert!(!MetadataError::Internal("boom".to_string()).is_domain());
        assert!(!MetadataError::Database(sqlx::Error::PoolTimedOut).is_domain());
    }

    #[test]
    fn test_pool_timeout_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_owner_write_error_passes_other_failures_through() {
        let err = owner_write_error(sqlx::Error::PoolTimedOut, "alice");
        assert!(matches!(err, MetadataError::Database(_)));
    }
}
