//! Repository trait for URL mapping data access.

use std::fmt;

use crate::domain::entities::{NewUrlMapping, UrlMapping};
use async_trait::async_trait;

/// A column protected by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
    ShortCode,
    NormalizedUrl,
}

impl UniqueColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueColumn::ShortCode => "short_code",
            UniqueColumn::NormalizedUrl => "normalized_url",
        }
    }
}

impl fmt::Display for UniqueColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An insert would duplicate a unique column. Nothing was written.
    #[error("unique constraint violated on {column}")]
    UniqueViolation { column: UniqueColumn },

    /// The store did not answer before the caller's deadline.
    #[error("store operation timed out")]
    Timeout,

    /// Connectivity, query or driver failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_unique_violation_on(&self, column: UniqueColumn) -> bool {
        matches!(self, StoreError::UniqueViolation { column: c } if *c == column)
    }
}

/// Listing criteria for [`UrlMappingRepository::list`] and
/// [`UrlMappingRepository::count`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMappingFilter {
    /// Case-insensitive substring matched against `original_url` or `short_code`.
    pub search: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl UrlMappingFilter {
    /// Creates a new filter with pagination parameters.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            search: None,
            offset,
            limit,
        }
    }

    /// Adds a search term. Blank terms are ignored.
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}

/// Store interface consumed by the shortener.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlMappingRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryUrlMappingRepository`] - process-local
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlMappingRepository: Send + Sync {
    /// Finds the mapping whose normalized URL equals `normalized_url`.
    async fn find_by_normalized_url(
        &self,
        normalized_url: &str,
    ) -> Result<Option<UrlMapping>, StoreError>;

    /// Finds the mapping for a short code.
    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Atomically inserts a new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] naming the colliding column if
    /// either `short_code` or `normalized_url` already exists. Any other
    /// failure is reported as [`StoreError::Backend`].
    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, StoreError>;

    /// Returns true if a mapping with this short code exists.
    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError>;

    /// Lists mappings newest first.
    async fn list(&self, filter: &UrlMappingFilter) -> Result<Vec<UrlMapping>, StoreError>;

    /// Counts mappings matching the filter's search term, ignoring pagination.
    async fn count(&self, filter: &UrlMappingFilter) -> Result<i64, StoreError>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
