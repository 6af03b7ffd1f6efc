//! URL mapping entity.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum accepted length of an original URL, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// A persisted mapping between a short code and the URL it redirects to.
///
/// Mappings are immutable once created. `original_url` is kept byte-for-byte
/// as submitted; `normalized_url` is only used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlMapping {
    pub id: i64,
    pub original_url: String,
    pub normalized_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UrlMapping {
    /// Creates a new UrlMapping instance.
    pub fn new(
        id: i64,
        original_url: String,
        normalized_url: String,
        short_code: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_url,
            normalized_url,
            short_code,
            created_at,
            updated_at: created_at,
        }
    }

    /// Returns true if `term` occurs in the original URL or the short code.
    ///
    /// Matching is case-insensitive, mirroring `ILIKE '%term%'` in the SQL store.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.original_url.to_lowercase().contains(&term)
            || self.short_code.to_lowercase().contains(&term)
    }
}

/// Input data for creating a new mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlMapping {
    pub original_url: String,
    pub normalized_url: String,
    pub short_code: String,
}
