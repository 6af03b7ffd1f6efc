//! DTOs for the URL listing endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::pagination::PaginationParams;
use crate::domain::entities::UrlMapping;

/// Query parameters for `GET /api/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct ListUrlsQuery {
    /// Case-insensitive substring matched against the original URL and the code.
    #[validate(length(max = 256, message = "Search term is too long"))]
    pub search: Option<String>,

    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Paginated listing of short links, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUrlsResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub items: Vec<UrlListItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlListItem {
    pub id: i64,
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
}

impl UrlListItem {
    pub fn new(mapping: UrlMapping, short_url: String) -> Self {
        Self {
            id: mapping.id,
            code: mapping.short_code,
            short_url,
            original_url: mapping.original_url,
            created_at: mapping.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parses_search_and_pagination() {
        let query: ListUrlsQuery =
            serde_json::from_str(r#"{"search": "example", "page": "2", "page_size": "10"}"#)
                .unwrap();

        assert_eq!(query.search.as_deref(), Some("example"));
        assert_eq!(query.pagination.page, Some(2));
        assert_eq!(query.pagination.page_size, Some(10));
    }

    #[test]
    fn test_long_search_term_is_rejected() {
        let query = ListUrlsQuery {
            search: Some("x".repeat(257)),
            pagination: PaginationParams::default(),
        };
        assert!(query.validate().is_err());
    }
}
