//! Core domain types shared across the Shelfwise crates.
//!
//! This crate defines the vocabulary used by the store and the server:
//! - Book source, reading status and rating
//! - Shelf naming rules and the default shelf name
//! - Username and email rules for profiles
//! - Pagination metadata
//! - Configuration

pub mod book;
pub mod config;
pub mod error;
pub mod pagination;
pub mod profile;
pub mod shelf;

pub use book::{BookRating, BookSource, ReadingStatus};
pub use error::{Error, Result};
pub use pagination::{PageRequest, PaginationMetadata};
pub use profile::{normalize_email, normalize_username};
pub use shelf::{DEFAULT_SHELF_NAME, normalize_shelf_name};
