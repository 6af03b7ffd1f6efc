//! Handler for listing short links.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::urls::{ListUrlsQuery, ListUrlsResponse, UrlListItem};
use crate::domain::repositories::UrlMappingFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Lists short links, newest first.
///
/// # Endpoint
///
/// `GET /api/urls?search=example&page=1&page_size=25`
///
/// `search` matches the original URL or the short code, ignoring case.
///
/// # Errors
///
/// Returns 400 for an invalid page or page size.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    Query(query): Query<ListUrlsQuery>,
) -> Result<Json<ListUrlsResponse>, AppError> {
    query.validate()?;

    let page = query
        .pagination
        .validate()
        .map_err(|msg| AppError::bad_request(msg, json!({})))?;

    let filter = UrlMappingFilter::new(page.offset(), page.limit()).with_search(query.search);
    let listing = state.shortener.list(filter).await?;

    let items = listing
        .items
        .into_iter()
        .map(|mapping| {
            let short_url = state.shortener.short_reference(&mapping.short_code);
            UrlListItem::new(mapping, short_url)
        })
        .collect();

    Ok(Json(ListUrlsResponse {
        page: page.page,
        page_size: page.page_size,
        total: listing.total,
        items,
    }))
}
