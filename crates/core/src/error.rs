//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid shelf name: {0}")]
    InvalidShelfName(String),

    #[error("invalid rating: {0} (must be between 0 and 5)")]
    InvalidRating(i64),

    #[error("invalid book source: {0}")]
    InvalidBookSource(String),

    #[error("invalid reading status: {0}")]
    InvalidReadingStatus(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
