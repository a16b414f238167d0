//! PostgreSQL-based metadata store implementation.

use crate::error::{
    MetadataError, MetadataResult, is_unique_violation, owner_write_error, user_conflict,
};
use crate::models::*;
use crate::repos::{LibraryRepo, ShelfRepo, TokenRepo, UserRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use shelfwise_core::DEFAULT_SHELF_NAME;
use shelfwise_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{FromRow, Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Library row with its shelf ids aggregated by the database.
#[derive(FromRow)]
struct AggregatedBookRow {
    #[sqlx(flatten)]
    book: LibraryBookRow,
    shelf_ids: Vec<Uuid>,
}

impl AggregatedBookRow {
    fn into_book(self) -> MetadataResult<LibraryBook> {
        LibraryBook::from_row(self.book, self.shelf_ids)
    }
}

const AGGREGATED_BOOK_SELECT: &str = r#"
    SELECT lb.*,
           COALESCE(
               array_agg(sb.shelf_id ORDER BY sb.added_at, sb.shelf_id)
                   FILTER (WHERE sb.shelf_id IS NOT NULL),
               '{}'::uuid[]
           ) AS shelf_ids
    FROM library_books lb
    LEFT JOIN shelf_books sb ON sb.owner_id = lb.owner_id AND sb.book_id = lb.book_id
"#;

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters,
    /// so the password can come from the environment instead of a URL.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for PostgresStore {
    async fn create_user(&self, user: &UserRow) -> MetadataResult<ShelfRow> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_name, last_name, email, profile_photo_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
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
                return Err(user_conflict(&e, &user.user_id, &user.username, &user.email));
            }
            Err(e) => return Err(e.into()),
        }

        let shelf = sqlx::query_as::<_, ShelfRow>(
            r#"
            INSERT INTO shelves (shelf_id, owner_id, shelf_name, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, TRUE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.user_id)
        .bind(DEFAULT_SHELF_NAME)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(shelf)
    }

    async fn get_user(&self, user_id: &str) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
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
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                profile_photo_url = CASE WHEN $6 THEN $7 ELSE profile_photo_url END
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(update.profile_photo_url.is_some())
        .bind(update.profile_photo_url.clone().flatten())
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
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
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
impl TokenRepo for PostgresStore {
    async fn create_token(&self, token: &ApiTokenRow) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO api_tokens (token_id, user_id, token_hash, description, created_at, last_used_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
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

    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<ApiTokenRow>> {
        let row = sqlx::query_as::<_, ApiTokenRow>("SELECT * FROM api_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
        sqlx::query("UPDATE api_tokens SET last_used_at = $1 WHERE token_id = $2")
            .bind(used_at)
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()> {
        let result = sqlx::query(
            "UPDATE api_tokens SET revoked_at = $1 WHERE token_id = $2 AND revoked_at IS NULL",
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
impl ShelfRepo for PostgresStore {
    async fn create_shelf(&self, owner_id: &str, name: &str) -> MetadataResult<ShelfRow> {
        let now = db_now();
        let result = sqlx::query_as::<_, ShelfRow>(
            r#"
            INSERT INTO shelves (shelf_id, owner_id, shelf_name, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(shelf) => Ok(shelf),
            Err(e) if is_unique_violation(&e) => Err(MetadataError::DuplicateName(name.to_string())),
            Err(e) => Err(owner_write_error(e, owner_id)),
        }
    }

    async fn get_shelf(&self, owner_id: &str, shelf_id: Uuid) -> MetadataResult<Option<ShelfRow>> {
        let row =
            sqlx::query_as::<_, ShelfRow>("SELECT * FROM shelves WHERE shelf_id = $1 AND owner_id = $2")
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
            "SELECT * FROM shelves WHERE shelf_id = $1 AND owner_id = $2 FOR UPDATE",
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
            UPDATE shelves SET shelf_name = $1, updated_at = $2
            WHERE shelf_id = $3 AND owner_id = $4 AND NOT is_default
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
            Ok(None) => return Err(MetadataError::NotFound(format!("shelf {shelf_id} not found"))),
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
            "SELECT is_default FROM shelves WHERE shelf_id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(shelf_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        match is_default {
            None => return Err(MetadataError::NotFound(format!("shelf {shelf_id} not found"))),
            Some(true) => return Err(MetadataError::DefaultShelfProtected(shelf_id)),
            Some(false) => {}
        }

        sqlx::query("DELETE FROM shelves WHERE shelf_id = $1 AND owner_id = $2 AND NOT is_default")
            .bind(shelf_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_shelves(&self, owner_id: &str) -> MetadataResult<Vec<ShelfRow>> {
        let rows = sqlx::query_as::<_, ShelfRow>(
            r#"
            SELECT * FROM shelves
            WHERE owner_id = $1
            ORDER BY is_default DESC, created_at ASC, shelf_name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl LibraryRepo for PostgresStore {
    async fn upsert_library_book(
        &self,
        owner_id: &str,
        book: &LibraryBookInput,
        shelf_ids: &[Uuid],
    ) -> MetadataResult<()> {
        let now = db_now();
        let mut tx = self.pool.begin().await?;

        // The conflicting row stays locked until commit, so a second upsert of
        // the same book waits here and then overwrites the whole assignment set.
        sqlx::query(
            r#"
            INSERT INTO library_books
                (owner_id, book_id, title, author_name, book_image, rating, source, reading_status, added_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (owner_id, book_id) DO UPDATE SET
                title = EXCLUDED.title,
                author_name = EXCLUDED.author_name,
                book_image = EXCLUDED.book_image,
                rating = EXCLUDED.rating,
                source = EXCLUDED.source,
                reading_status = EXCLUDED.reading_status,
                updated_at = EXCLUDED.updated_at
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
        .execute(&mut *tx)
        .await
        .map_err(|e| owner_write_error(e, owner_id))?;

        sqlx::query("DELETE FROM shelf_books WHERE owner_id = $1 AND book_id = $2")
            .bind(owner_id)
            .bind(&book.book_id)
            .execute(&mut *tx)
            .await?;

        for shelf_id in dedup_shelf_ids(shelf_ids) {
            // FOR SHARE keeps a concurrent delete_shelf from racing the insert.
            let owned: Option<Uuid> = sqlx::query_scalar(
                "SELECT shelf_id FROM shelves WHERE shelf_id = $1 AND owner_id = $2 FOR SHARE",
            )
            .bind(shelf_id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;

            if owned.is_none() {
                return Err(MetadataError::ShelfNotFound(shelf_id));
            }

            sqlx::query(
                "INSERT INTO shelf_books (shelf_id, owner_id, book_id, added_at) VALUES ($1, $2, $3, $4)",
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
        let query = format!(
            "{AGGREGATED_BOOK_SELECT} WHERE lb.owner_id = $1 AND lb.book_id = $2 GROUP BY lb.owner_id, lb.book_id"
        );
        let row = sqlx::query_as::<_, AggregatedBookRow>(&query)
            .bind(owner_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AggregatedBookRow::into_book).transpose()
    }

    async fn remove_library_book(&self, owner_id: &str, book_id: &str) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM library_books WHERE owner_id = $1 AND book_id = $2")
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

        let book: Option<String> = sqlx::query_scalar(
            "SELECT book_id FROM library_books WHERE owner_id = $1 AND book_id = $2 FOR SHARE",
        )
        .bind(owner_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;
        if book.is_none() {
            return Err(MetadataError::BookNotFound(book_id.to_string()));
        }

        let shelf: Option<Uuid> = sqlx::query_scalar(
            "SELECT shelf_id FROM shelves WHERE shelf_id = $1 AND owner_id = $2 FOR SHARE",
        )
        .bind(shelf_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        if shelf.is_none() {
            return Err(MetadataError::ShelfNotFound(shelf_id));
        }

        sqlx::query(
            r#"
            INSERT INTO shelf_books (shelf_id, owner_id, book_id, added_at)
            VALUES ($1, $2, $3, $4)
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
        sqlx::query("DELETE FROM shelf_books WHERE owner_id = $1 AND book_id = $2 AND shelf_id = $3")
            .bind(owner_id)
            .bind(book_id)
            .bind(shelf_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_library(&self, owner_id: &str) -> MetadataResult<Vec<LibraryBook>> {
        let query = format!(
            "{AGGREGATED_BOOK_SELECT} WHERE lb.owner_id = $1 \
             GROUP BY lb.owner_id, lb.book_id \
             ORDER BY lb.added_at DESC, lb.book_id ASC"
        );
        let rows = sqlx::query_as::<_, AggregatedBookRow>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AggregatedBookRow::into_book).collect()
    }

    async fn list_shelf_books(
        &self,
        owner_id: &str,
        shelf_id: Uuid,
    ) -> MetadataResult<Vec<LibraryBook>> {
        let query = format!(
            "{AGGREGATED_BOOK_SELECT} WHERE lb.owner_id = $1 \
             AND EXISTS (SELECT 1 FROM shelf_books x \
                         WHERE x.owner_id = lb.owner_id AND x.book_id = lb.book_id AND x.shelf_id = $2) \
             GROUP BY lb.owner_id, lb.book_id \
             ORDER BY lb.added_at DESC, lb.book_id ASC"
        );
        let rows = sqlx::query_as::<_, AggregatedBookRow>(&query)
            .bind(owner_id)
            .bind(shelf_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AggregatedBookRow::into_book).collect()
    }
}
