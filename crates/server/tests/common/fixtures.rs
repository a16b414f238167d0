//! Test fixtures for generating test data.

use sha2::{Digest, Sha256};
use shelfwise_core::{BookRating, BookSource, ReadingStatus};
use shelfwise_metadata::models::{ShelfRow, UserRow, db_now};
use shelfwise_metadata::{MetadataStore, models::LibraryBookInput};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique user ids within a test binary.
static USER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Compute SHA-256 hash of data as hex string.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build a user row with a unique id and username.
#[allow(dead_code)]
pub fn test_user(prefix: &str) -> UserRow {
    let n = USER_COUNTER.fetch_add(1, Ordering::Relaxed);
    UserRow {
        user_id: format!("{prefix}-{n}"),
        username: format!("{prefix}_{n}"),
        first_name: "Test".to_string(),
        last_name: "Reader".to_string(),
        email: format!("{prefix}{n}@example.com"),
        profile_photo_url: None,
        created_at: db_now(),
    }
}

/// Create a user and return its id together with its default shelf.
#[allow(dead_code)]
pub async fn create_test_user(store: &dyn MetadataStore, prefix: &str) -> (String, ShelfRow) {
    let user = test_user(prefix);
    let shelf = store
        .create_user(&user)
        .await
        .expect("Failed to create test user");
    (user.user_id, shelf)
}

/// Book metadata with sensible defaults.
#[allow(dead_code)]
pub fn book_input(book_id: &str, title: &str) -> LibraryBookInput {
    LibraryBookInput {
        book_id: book_id.to_string(),
        title: title.to_string(),
        author_name: "Test Author".to_string(),
        book_image: None,
        rating: BookRating::UNSPECIFIED,
        source: BookSource::Manual,
        reading_status: ReadingStatus::WantToRead,
    }
}
