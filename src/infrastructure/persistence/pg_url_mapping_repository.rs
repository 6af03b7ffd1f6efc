//! PostgreSQL implementation of the URL mapping store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrlMapping, UrlMapping};
use crate::domain::repositories::{
    StoreError, UniqueColumn, UrlMappingFilter, UrlMappingRepository,
};

/// Unique constraint on `url_mappings.short_code` (see `migrations/`).
const SHORT_CODE_CONSTRAINT: &str = "url_mappings_short_code_key";

/// Unique constraint on `url_mappings.normalized_url` (see `migrations/`).
const NORMALIZED_URL_CONSTRAINT: &str = "url_mappings_normalized_url_key";

#[derive(sqlx::FromRow)]
struct UrlMappingRow {
    id: i64,
    original_url: String,
    normalized_url: String,
    short_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UrlMappingRow> for UrlMapping {
    fn from(row: UrlMappingRow) -> Self {
        UrlMapping {
            id: row.id,
            original_url: row.original_url,
            normalized_url: row.normalized_url,
            short_code: row.short_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL store.
///
/// Uniqueness of both `short_code` and `normalized_url` is enforced by the
/// table's constraints, so a single `INSERT` is the atomic check-and-insert.
pub struct PgUrlMappingRepository {
    pool: Arc<PgPool>,
}

impl PgUrlMappingRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Translates SQLx errors, naming the column when a unique constraint fired.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_unique_violation()
    {
        match db_err.constraint() {
            Some(SHORT_CODE_CONSTRAINT) => {
                return StoreError::UniqueViolation {
                    column: UniqueColumn::ShortCode,
                };
            }
            Some(NORMALIZED_URL_CONSTRAINT) => {
                return StoreError::UniqueViolation {
                    column: UniqueColumn::NormalizedUrl,
                };
            }
            _ => {}
        }
    }

    StoreError::Backend(e.to_string())
}

/// Builds an `ILIKE` pattern matching `term` literally anywhere in a column.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl UrlMappingRepository for PgUrlMappingRepository {
    async fn find_by_normalized_url(
        &self,
        normalized_url: &str,
    ) -> Result<Option<UrlMapping>, StoreError> {
        let row = sqlx::query_as::<_, UrlMappingRow>(
            r#"
            SELECT id, original_url, normalized_url, short_code, created_at, updated_at
            FROM url_mappings
            WHERE normalized_url = $1
            "#,
        )
        .bind(normalized_url)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UrlMapping::from))
    }

    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlMapping>, StoreError> {
        let row = sqlx::query_as::<_, UrlMappingRow>(
            r#"
            SELECT id, original_url, normalized_url, short_code, created_at, updated_at
            FROM url_mappings
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UrlMapping::from))
    }

    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, StoreError> {
        let row = sqlx::query_as::<_, UrlMappingRow>(
            r#"
            INSERT INTO url_mappings (original_url, normalized_url, short_code)
            VALUES ($1, $2, $3)
            RETURNING id, original_url, normalized_url, short_code, created_at, updated_at
            "#,
        )
        .bind(&new_mapping.original_url)
        .bind(&new_mapping.normalized_url)
        .bind(&new_mapping.short_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM url_mappings WHERE short_code = $1)",
        )
        .bind(code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list(&self, filter: &UrlMappingFilter) -> Result<Vec<UrlMapping>, StoreError> {
        let pattern = filter.search.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, UrlMappingRow>(
            r#"
            SELECT id, original_url, normalized_url, short_code, created_at, updated_at
            FROM url_mappings
            WHERE ($1::text IS NULL OR original_url ILIKE $1 OR short_code ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UrlMapping::from).collect())
    }

    async fn count(&self, filter: &UrlMappingFilter) -> Result<i64, StoreError> {
        let pattern = filter.search.as_deref().map(contains_pattern);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM url_mappings
            WHERE ($1::text IS NULL OR original_url ILIKE $1 OR short_code ILIKE $1)
            "#,
        )
        .bind(pattern)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
