//! Handler for short link redirects.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /jump/{code}`
///
/// # Request Flow
///
/// 1. Check the cache for the code
/// 2. On a miss, resolve through the shortener
/// 3. Populate the cache in the background
/// 4. Return 302 Found with `Location` set to the original URL
///
/// Cache failures are treated as misses.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let original_url = match state.cache.get_url(&code).await {
        Ok(Some(url)) => url,
        Ok(None) => resolve_and_cache(&state, &code).await?,
        Err(e) => {
            warn!(code = %code, error = %e, "Cache lookup failed, falling back to store");
            state.shortener.resolve(&code).await?
        }
    };

    let location = location_header(&original_url)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

async fn resolve_and_cache(state: &AppState, code: &str) -> Result<String, AppError> {
    let original_url = state.shortener.resolve(code).await?;

    let cache = state.cache.clone();
    let code = code.to_string();
    let url = original_url.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.set_url(&code, &url, None).await {
            debug!(code = %code, error = %e, "Failed to cache redirect");
        }
    });

    Ok(original_url)
}

/// Uses the stored URL verbatim, falling back to its percent-encoded
/// serialization when the raw bytes are not a legal header value.
fn location_header(original_url: &str) -> Result<HeaderValue, AppError> {
    if let Ok(value) = HeaderValue::from_str(original_url) {
        return Ok(value);
    }

    Url::parse(original_url)
        .ok()
        .and_then(|url| HeaderValue::from_str(url.as_str()).ok())
        .ok_or_else(|| {
            AppError::internal(
                "Stored URL cannot be used as a redirect target",
                json!({ "url": original_url }),
            )
        })
}
