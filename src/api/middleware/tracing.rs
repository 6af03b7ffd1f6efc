//! Request tracing keyed by route template.
//!
//! Every short code hits a different URI, so spans carry the matched route
//! (`/jump/{code}`) next to the concrete URI. Log filters and aggregations
//! can then group redirect traffic without parsing paths.

use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Opens an `INFO` span per request tagged with method, route and URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteSpan;

impl<B> MakeSpan<B> for RouteSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            route = route_label(request),
            uri = %request.uri(),
        )
    }
}

fn route_label<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
}

pub type HttpTraceLayer = TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RouteSpan>;

/// Tracing layer for the whole router.
///
/// Must be added with `Router::layer` so the matched route is known when the
/// span opens. Responses are logged at `INFO` with latency in milliseconds:
///
/// ```text
/// INFO request{method=GET route=/jump/{code} uri=/jump/0a9f3c}: finished processing request latency=1 ms status=302
/// INFO request{method=POST route=/api/shorten uri=/api/shorten}: finished processing request latency=9 ms status=201
/// ```
pub fn layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RouteSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
