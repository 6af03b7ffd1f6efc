//! Handler for the link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link, or returns the existing one for an equivalent URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page?x=1" }
/// ```
///
/// # Response
///
/// **201 Created** for a new link, **200 OK** when the normalized URL was
/// already shortened:
///
/// ```json
/// {
///   "code": "0a9f3c",
///   "short_url": "https://jmp.example/jump/0a9f3c",
///   "original_url": "https://example.com/page?x=1",
///   "created": true,
///   "created_at": "2026-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 for a malformed URL
/// - 503 when no free code was found within the attempt limit
/// - 500/503 for storage failures
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let shortened = state.shortener.shorten(&payload.url).await?;

    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(shortened.into())))
}
