//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{LibraryRepo, ShelfRepo, TokenRepo, UserRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: UserRepo + TokenRepo + ShelfRepo + LibraryRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store. Pass `":memory:"` for a throwaway database.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let busy_timeout = Duration::from_secs(query_timeout_secs.unwrap_or(5));

        let opts = if path == Path::new(":memory:") {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        };

        let opts = opts
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Cascades from shelves/library_books into shelf_books depend on this.
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // A single connection serializes writers, so concurrent upserts of
            // the same book queue up instead of failing with "database is locked".
            // It also keeps an in-memory database alive for the pool's lifetime.
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(busy_timeout.max(Duration::from_secs(30)))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "SQLite metadata store ready");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::error::{is_unique_violation, owner_write_error, user_conflict};
    use crate::models::*;
    use shelfwise_core::DEFAULT_SHELF_NAME;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(&self, user: &UserRow) -> MetadataResult<ShelfRow> {
            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO users (user_id, username, first_name, last_name, email, profile_photo_url, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&user.user_id)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.profile_photo_url)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(user_conflict(
                        &e,
                        &user.user_id,
                        &user.username,
                        &user.email,
                    ));
                }
                Err(e) => return Err(e.into()),
            }

            let shelf = sqlx::query_as::<_, ShelfRow>(
                r#"
                INSERT INTO shelves (shelf_id, owner_id, shelf_name, is_default, created_at, updated_at)
                VALUES (?, ?, ?, 1, ?, ?)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&user.user_id)
            .bind(DEFAULT_SHELF_NAME)
            .bind(user.created_at)
            .bind(user.created_at)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(shelf)
        }

        async fn get_user(&self, user_id: &str) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn update_user(
            &self,
            user_id: &str,
            update: &UserProfileUpdate,
        ) -> MetadataResult<UserRow> {
            let result = sqlx::query_as::<_, UserRow>(
                r#"
                UPDATE users SET
                    username = COALESCE(?, username),
                    first_name = COALESCE(?, first_name),
                    last_name = COALESCE(?, last_name),
                    email = COALESCE(?, email),
                    profile_photo_url = CASE WHEN ? THEN ? ELSE profile_photo_url END
                WHERE user_id = ?
                RETURNING *
                "#,
            )
            .bind(&update.username)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.email)
            .bind(update.profile_photo_url.is_some())
            .bind(update.profile_photo_url.clone().flatten())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await;

            match result {
                Ok(Some(row)) => Ok(row),
                Ok(None) => Err(MetadataError::NotFound(format!("user {user_id} not found"))),
                Err(e) if is_unique_violation(&e) => Err(user_conflict(
                    &e,
                    user_id,
                    update.username.as_deref().unwrap_or_default(),
                    update.email.as_deref().unwrap_or_default(),
                )),
                Err(e) => Err(e.into()),
            }
        }

        async fn delete_user(&self, user_id: &str) -> MetadataResult<()> {
            // Shelves and library rows go with it through ON DELETE CASCADE.
            let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("user {user_id} not found")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TokenRepo for SqliteStore {
        async fn create_token(&self, token: &ApiTokenRow) -> MetadataResult<()> {
            let result = sqlx::query(
                r#"
                INSERT INTO api_tokens (token_id, user_id, token_hash, description, created_at, last_used_at, revoked_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.token_id)
            .bind(&token.user_id)
            .bind(&token.token_hash)
            .bind(&token.description)
            .bind(token.created_at)
            .bind(token.last_used_at)
            .bind(token.revoked_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => Err(MetadataError::AlreadyExists(
                    "token hash already registered".to_string(),
                )),
                Err(e) => Err(e.into()),
            }
        }

        async fn get_token_by_hash(
            &self,
            token_hash: &str,
        ) -> MetadataResult<Option<ApiTokenRow>> {
            let row =
                sqlx::query_as::<_, ApiTokenRow>("SELECT * FROM api_tokens WHERE token_hash = ?")
                    .bind(token_hash)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        }

        async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
            sqlx::query("UPDATE api_tokens SET last_used_at = ? WHERE token_id = ?")
                .bind(used_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn revoke_token(
            &self,
            token_id: Uuid,
            revoked_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE api_tokens SET revoked_at = ? WHERE token_id = ? AND revoked_at IS NULL",
            )
            .bind(revoked_at)
            .bind(token_id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "active token {token_id} not found"
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ShelfRepo for SqliteStore {
        async fn create_shelf(&self, owner_id: &str, name: &str) -> MetadataResult<ShelfRow> {
            let now = db_now();
            let result = sqlx::query_as::<_, ShelfRow>(
                r#"
                INSERT INTO shelves (shelf_id, owner_id, shelf_name, is_default, created_at, updated_at)
                VALUES (?, ?, ?, 0, ?, ?)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(name)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(shelf) => Ok(shelf),
                Err(e) if is_unique_violation(&e) => {
                    Err(MetadataError::DuplicateName(name.to_string()))
                }
                Err(e) => Err(owner_write_error(e, owner_id)),
            }
        }

        async fn get_shelf(
            &self,
            owner_id: &str,
            shelf_id: Uuid,
        ) -> MetadataResult<Option<ShelfRow>> {
            let row = sqlx::query_as::<_, ShelfRow>(
                "SELECT * FROM shelves WHERE shelf_id = ? AND owner_id = ?",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn update_shelf(
            &self,
            owner_id: &str,
            shelf_id: Uuid,
            name: &str,
        ) -> MetadataResult<ShelfRow> {
            let mut tx = self.pool.begin().await?;

            let existing = sqlx::query_as::<_, ShelfRow>(
                "SELECT * FROM shelves WHERE shelf_id = ? AND owner_id = ?",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("shelf {shelf_id} not found")))?;

            if existing.is_default {
                return Err(MetadataError::DefaultShelfProtected(shelf_id));
            }

            let updated = sqlx::query_as::<_, ShelfRow>(
                r#"
                UPDATE shelves SET shelf_name = ?, updated_at = ?
                WHERE shelf_id = ? AND owner_id = ? AND is_default = 0
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(db_now())
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await;

            let updated = match updated {
                Ok(Some(row)) => row,
                Ok(None) => {
                    return Err(MetadataError::NotFound(format!("shelf {shelf_id} not found")));
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(MetadataError::DuplicateName(name.to_string()));
                }
                Err(e) => return Err(e.into()),
            };

            tx.commit().await?;
            Ok(updated)
        }

        async fn delete_shelf(&self, owner_id: &str, shelf_id: Uuid) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            let is_default: Option<bool> = sqlx::query_scalar(
                "SELECT is_default FROM shelves WHERE shelf_id = ? AND owner_id = ?",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;

            match is_default {
                None => {
                    return Err(MetadataError::NotFound(format!("shelf {shelf_id} not found")));
                }
                Some(true) => return Err(MetadataError::DefaultShelfProtected(shelf_id)),
                Some(false) => {}
            }

            // shelf_books rows go with it via ON DELETE CASCADE.
            let result = sqlx::query(
                "DELETE FROM shelves WHERE shelf_id = ? AND owner_id = ? AND is_default = 0",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("shelf {shelf_id} not found")));
            }

            tx.commit().await?;
            Ok(())
        }

        // Timestamps are RFC3339 text with a variable-length fraction, so
        // ordering goes through unixepoch() rather than string comparison.
        async fn list_shelves(&self, owner_id: &str) -> MetadataResult<Vec<ShelfRow>> {
            let rows = sqlx::query_as::<_, ShelfRow>(
                r#"
                SELECT * FROM shelves
                WHERE owner_id = ?
                ORDER BY is_default DESC, unixepoch(created_at, 'subsec') ASC, shelf_name ASC
                "#,
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl LibraryRepo for SqliteStore {
        async fn upsert_library_book(
            &self,
            owner_id: &str,
            book: &LibraryBookInput,
            shelf_ids: &[Uuid],
        ) -> MetadataResult<()> {
            let now = db_now();
            let mut tx = self.pool.begin().await?;

            // Metadata first: on conflict this holds the row for the rest of
            // the transaction, so concurrent upserts of the same book serialize.
            sqlx::query(
                r#"
                INSERT INTO library_books
                    (owner_id, book_id, title, author_name, book_image, rating, source, reading_status, added_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (owner_id, book_id) DO UPDATE SET
                    title = excluded.title,
                    author_name = excluded.author_name,
                    book_image = excluded.book_image,
                    rating = excluded.rating,
                    source = excluded.source,
                    reading_status = excluded.reading_status,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(owner_id)
            .bind(&book.book_id)
            .bind(&book.title)
            .bind(&book.author_name)
            .bind(&book.book_image)
            .bind(i32::from(book.rating.value()))
            .bind(book.source.code())
            .bind(book.reading_status.code())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| owner_write_error(e, owner_id))?;

            sqlx::query("DELETE FROM shelf_books WHERE owner_id = ? AND book_id = ?")
                .bind(owner_id)
                .bind(&book.book_id)
                .execute(&mut *tx)
                .await?;

            for shelf_id in dedup_shelf_ids(shelf_ids) {
                let owned: Option<Uuid> = sqlx::query_scalar(
                    "SELECT shelf_id FROM shelves WHERE shelf_id = ? AND owner_id = ?",
                )
                .bind(shelf_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;

                if owned.is_none() {
                    // Dropping tx rolls back the upsert and the delete above.
                    return Err(MetadataError::ShelfNotFound(shelf_id));
                }

                sqlx::query(
                    "INSERT INTO shelf_books (shelf_id, owner_id, book_id, added_at) VALUES (?, ?, ?, ?)",
                )
                .bind(shelf_id)
                .bind(owner_id)
                .bind(&book.book_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }

        async fn get_library_book(
            &self,
            owner_id: &str,
            book_id: &str,
        ) -> MetadataResult<Option<LibraryBook>> {
            let mut tx = self.pool.begin().await?;

            let Some(row) = sqlx::query_as::<_, LibraryBookRow>(
                "SELECT * FROM library_books WHERE owner_id = ? AND book_id = ?",
            )
            .bind(owner_id)
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            else {
                return Ok(None);
            };

            let shelf_ids: Vec<Uuid> = sqlx::query_scalar(
                r#"
                SELECT shelf_id FROM shelf_books
                WHERE owner_id = ? AND book_id = ?
                ORDER BY unixepoch(added_at, 'subsec') ASC, shelf_id ASC
                "#,
            )
            .bind(owner_id)
            .bind(book_id)
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;
            LibraryBook::from_row(row, shelf_ids).map(Some)
        }

        async fn remove_library_book(&self, owner_id: &str, book_id: &str) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM library_books WHERE owner_id = ? AND book_id = ?")
                .bind(owner_id)
                .bind(book_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "book {book_id} not found in library"
                )));
            }
            Ok(())
        }

        async fn add_book_to_shelf(
            &self,
            owner_id: &str,
            book_id: &str,
            shelf_id: Uuid,
        ) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            let book_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM library_books WHERE owner_id = ? AND book_id = ?)",
            )
            .bind(owner_id)
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            if !book_exists {
                return Err(MetadataError::BookNotFound(book_id.to_string()));
            }

            let shelf_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM shelves WHERE shelf_id = ? AND owner_id = ?)",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;
            if !shelf_exists {
                return Err(MetadataError::ShelfNotFound(shelf_id));
            }

            sqlx::query(
                r#"
                INSERT INTO shelf_books (shelf_id, owner_id, book_id, added_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (shelf_id, book_id) DO NOTHING
                "#,
            )
            .bind(shelf_id)
            .bind(owner_id)
            .bind(book_id)
            .bind(db_now())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(())
        }

        async fn remove_book_from_shelf(
            &self,
            owner_id: &str,
            book_id: &str,
            shelf_id: Uuid,
        ) -> MetadataResult<()> {
            sqlx::query(
                "DELETE FROM shelf_books WHERE owner_id = ? AND book_id = ? AND shelf_id = ?",
            )
            .bind(owner_id)
            .bind(book_id)
            .bind(shelf_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn list_library(&self, owner_id: &str) -> MetadataResult<Vec<LibraryBook>> {
            let mut tx = self.pool.begin().await?;

            let rows = sqlx::query_as::<_, LibraryBookRow>(
                r#"
                SELECT * FROM library_books
                WHERE owner_id = ?
                ORDER BY unixepoch(added_at, 'subsec') DESC, book_id ASC
                "#,
            )
            .bind(owner_id)
            .fetch_all(&mut *tx)
            .await?;

            let links = sqlx::query_as::<_, ShelfLinkRow>(
                r#"
                SELECT book_id, shelf_id FROM shelf_books
                WHERE owner_id = ?
                ORDER BY unixepoch(added_at, 'subsec') ASC, shelf_id ASC
                "#,
            )
            .bind(owner_id)
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;
            attach_shelf_ids(rows, links)
        }

        async fn list_shelf_books(
            &self,
            owner_id: &str,
            shelf_id: Uuid,
        ) -> MetadataResult<Vec<LibraryBook>> {
            let mut tx = self.pool.begin().await?;

            let rows = sqlx::query_as::<_, LibraryBookRow>(
                r#"
                SELECT lb.* FROM library_books lb
                WHERE lb.owner_id = ?
                  AND EXISTS (
                      SELECT 1 FROM shelf_books sb
                      WHERE sb.owner_id = lb.owner_id
                        AND sb.book_id = lb.book_id
                        AND sb.shelf_id = ?
                  )
                ORDER BY unixepoch(lb.added_at, 'subsec') DESC, lb.book_id ASC
                "#,
            )
            .bind(owner_id)
            .bind(shelf_id)
            .fetch_all(&mut *tx)
            .await?;

            let links = sqlx::query_as::<_, ShelfLinkRow>(
                r#"
                SELECT book_id, shelf_id FROM shelf_books
                WHERE owner_id = ?
                  AND book_id IN (
                      SELECT book_id FROM shelf_books WHERE shelf_id = ? AND owner_id = ?
                  )
                ORDER BY unixepoch(added_at, 'subsec') ASC, shelf_id ASC
                "#,
            )
            .bind(owner_id)
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;
            attach_shelf_ids(rows, links)
        }
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    profile_photo_url TEXT,
    created_at TEXT NOT NULL
);

-- Empty means no email on file
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email) WHERE email <> '';

-- Not tied to users: a caller holds a token before creating a profile and
-- keeps it after deleting one.
CREATE TABLE IF NOT EXISTS api_tokens (
    token_id BLOB PRIMARY KEY,
    user_id TEXT NOT NULL,
    token_hash TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT NOT NULL,
    last_used_at TEXT,
    revoked_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_api_tokens_user ON api_tokens(user_id);

CREATE TABLE IF NOT EXISTS shelves (
    shelf_id BLOB PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    shelf_name TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (owner_id, shelf_name),
    UNIQUE (shelf_id, owner_id)
);
-- At most one default shelf per owner (partial unique index)
CREATE UNIQUE INDEX IF NOT EXISTS idx_shelves_one_default ON shelves(owner_id) WHERE is_default = 1;

CREATE TABLE IF NOT EXISTS library_books (
    owner_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    book_id TEXT NOT NULL,
    title TEXT NOT NULL,
    author_name TEXT NOT NULL,
    book_image TEXT,
    rating INTEGER NOT NULL DEFAULT 0,
    source INTEGER NOT NULL DEFAULT 0,
    reading_status INTEGER NOT NULL DEFAULT 0,
    added_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (owner_id, book_id)
);
CREATE INDEX IF NOT EXISTS idx_library_books_added ON library_books(owner_id, added_at);

-- The shelf must belong to the same owner as the book: both foreign keys
-- carry owner_id.
CREATE TABLE IF NOT EXISTS shelf_books (
    shelf_id BLOB NOT NULL,
    owner_id TEXT NOT NULL,
    book_id TEXT NOT NULL,
    added_at TEXT NOT NULL,
    PRIMARY KEY (shelf_id, book_id),
    FOREIGN KEY (shelf_id, owner_id) REFERENCES shelves(shelf_id, owner_id) ON DELETE CASCADE,
    FOREIGN KEY (owner_id, book_id) REFERENCES library_books(owner_id, book_id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_shelf_books_book ON shelf_books(owner_id, book_id);
"#;
