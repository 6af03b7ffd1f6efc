//! URL validation and normalization.
//!
//! [`validate_url`] is the only gate malformed input has to pass before the
//! shortener touches the store. [`normalize_url`] then derives the key used to
//! deduplicate submissions; it never fails.

use url::Url;

use crate::domain::entities::url_mapping::MAX_URL_LENGTH;

/// Reasons a submitted URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL is {0} bytes long, the maximum is {MAX_URL_LENGTH}")]
    TooLong(usize),

    #[error("URL must not contain whitespace or control characters")]
    ForbiddenCharacters,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is an absolute http(s) URL with a host.
///
/// # Rules
///
/// 1. Non-empty and at most [`MAX_URL_LENGTH`] bytes
/// 2. No whitespace or control characters (the string is redirected to verbatim)
/// 3. Parses as an absolute URL
/// 4. Scheme is `http` or `https`
/// 5. Host is present
///
/// # Errors
///
/// Returns the first [`UrlValidationError`] rule that fails.
pub fn validate_url(input: &str) -> Result<(), UrlValidationError> {
    if input.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    if input.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(input.len()));
    }

    if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(UrlValidationError::ForbiddenCharacters);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Normalizes a URL into its deduplication key.
///
/// # Normalization Rules
///
/// 1. **Case**: the whole URL is lower-cased
/// 2. **Scheme**: dropped, so `http://` and `https://` collapse
/// 3. **Port**: kept only when it differs from the scheme default
/// 4. **Fragment**: dropped
/// 5. **Query**: appended as `?query` when non-empty, parameter order untouched
///
/// The result is `host[:port] + path[?query]`, where the path is exactly as
/// written. Parameter ordering and trailing slashes are not canonicalized, so
/// `https://example.com` and `https://example.com/` are distinct keys.
///
/// Input that does not parse is still normalized: lower-cased, with any
/// `scheme://` prefix and `#fragment` stripped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_url("https://example.com/page?x=1"), "example.com/page?x=1");
/// assert_eq!(normalize_url("HTTP://Example.com/A#top"), "example.com/a");
/// ```
pub fn normalize_url(input: &str) -> String {
    let lowered = input.to_lowercase();

    let url = match Url::parse(&lowered) {
        Ok(url) => url,
        Err(_) => return normalize_unparsed(&lowered),
    };

    let Some(host) = url.host_str() else {
        return normalize_unparsed(&lowered);
    };

    let mut normalized = String::with_capacity(lowered.len());
    normalized.push_str(host);

    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    let path = url.path();
    if path != "/" || has_explicit_path(&lowered) {
        normalized.push_str(path);
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

/// Whether the authority in `lowered` is followed by a written path.
///
/// The parser reports `/` for both `https://a.com` and `https://a.com/`.
fn has_explicit_path(lowered: &str) -> bool {
    let after_scheme = match lowered.find("://") {
        Some(idx) => &lowered[idx + 3..],
        None => lowered,
    };

    after_scheme
        .find(['/', '\\', '?', '#'])
        .is_some_and(|idx| matches!(after_scheme.as_bytes()[idx], b'/' | b'\\'))
}

fn normalize_unparsed(lowered: &str) -> String {
    let without_fragment = lowered.split('#').next().unwrap_or(lowered);

    match without_fragment.find("://") {
        Some(idx) => without_fragment[idx + 3..].to_string(),
        None => without_fragment.to_string(),
    }
}
