//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::Shortened;

/// Request to shorten a single URL.
///
/// Only presence is checked here. The shortener applies the full URL rules,
/// including the byte-length limit.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,
}

/// A short link, either freshly created or previously issued.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    /// False when an existing link for the same normalized URL was returned.
    pub created: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Shortened> for ShortenResponse {
    fn from(shortened: Shortened) -> Self {
        Self {
            code: shortened.mapping.short_code,
            short_url: shortened.short_reference,
            original_url: shortened.mapping.original_url,
            created: shortened.created,
            created_at: shortened.mapping.created_at,
        }
    }
}
