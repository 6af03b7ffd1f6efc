//! Short link creation and resolution.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{NewUrlMapping, UrlMapping};
use crate::domain::repositories::{
    StoreError, UniqueColumn, UrlMappingFilter, UrlMappingRepository,
};
use crate::error::AppError;
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_normalizer::{normalize_url, validate_url};

/// Path segment under which short codes are served.
pub const REDIRECT_PREFIX: &str = "/jump/";

/// Default cap on candidate codes tried per `shorten` call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the caller-facing reference for a short code.
///
/// Without a base URL the reference is the bare path `/jump/{code}`.
#[derive(Debug, Clone, Default)]
pub struct ShortReferenceBuilder {
    base_url: Option<String>,
}

impl ShortReferenceBuilder {
    /// References rendered as `/jump/{code}`.
    pub fn relative() -> Self {
        Self { base_url: None }
    }

    /// References rendered as `{base_url}/jump/{code}`.
    pub fn absolute(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url: Some(base_url),
        }
    }

    pub fn build(&self, code: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{REDIRECT_PREFIX}{code}"),
            None => format!("{REDIRECT_PREFIX}{code}"),
        }
    }
}

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone)]
pub struct ShortenerOptions {
    /// Candidate codes tried before giving up with [`AppError::ExhaustedRetries`].
    pub max_attempts: u32,
    /// Ask the store whether a candidate exists before inserting it.
    pub precheck_codes: bool,
    /// Deadline applied to every store call.
    pub store_timeout: Duration,
    pub references: ShortReferenceBuilder,
}

impl Default for ShortenerOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            precheck_codes: false,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            references: ShortReferenceBuilder::relative(),
        }
    }
}

/// Result of [`ShortenerService::shorten`].
#[derive(Debug, Clone)]
pub struct Shortened {
    pub mapping: UrlMapping,
    pub short_reference: String,
    /// False when an existing mapping for the same normalized URL was returned.
    pub created: bool,
}

/// One page of a listing plus the total number of matches.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub items: Vec<UrlMapping>,
    pub total: i64,
}

/// Service for shortening URLs and resolving short codes.
///
/// Holds no mutable state: uniqueness of codes and normalized URLs is
/// enforced by the store's atomic insert, and this service only reacts to
/// the [`StoreError::UniqueViolation`] it reports.
pub struct ShortenerService<R: UrlMappingRepository + ?Sized = dyn UrlMappingRepository> {
    repository: Arc<R>,
    generator: CodeGenerator,
    options: ShortenerOptions,
}

impl<R: UrlMappingRepository + ?Sized> ShortenerService<R> {
    /// Creates a new shortener service. `max_attempts` is raised to at least 1.
    pub fn new(repository: Arc<R>, generator: CodeGenerator, mut options: ShortenerOptions) -> Self {
        options.max_attempts = options.max_attempts.max(1);
        Self {
            repository,
            generator,
            options,
        }
    }

    pub fn options(&self) -> &ShortenerOptions {
        &self.options
    }

    /// Shortens `raw_url`, returning the existing mapping when the same
    /// normalized URL was shortened before.
    ///
    /// # Flow
    ///
    /// 1. Validate; malformed input never reaches the store
    /// 2. Normalize and look up an existing mapping (fast path)
    /// 3. Generate a candidate and insert it, retrying on code collisions
    ///    up to `max_attempts` times
    /// 4. If the insert loses a race on the normalized URL, return the winner
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] for malformed URLs
    /// - [`AppError::ExhaustedRetries`] when every candidate collided
    /// - [`AppError::Storage`] for any other store failure, never retried
    pub async fn shorten(&self, raw_url: &str) -> Result<Shortened, AppError> {
        validate_url(raw_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let normalized_url = normalize_url(raw_url);

        if let Some(existing) = self
            .with_deadline(self.repository.find_by_normalized_url(&normalized_url))
            .await?
        {
            debug!(code = %existing.short_code, "URL already shortened");
            return Ok(self.shortened(existing, false));
        }

        for attempt in 1..=self.options.max_attempts {
            let code = self.generator.generate()?;

            if self.options.precheck_codes
                && self
                    .with_deadline(self.repository.exists_by_code(&code))
                    .await?
            {
                debug!(attempt, %code, "Candidate code already taken");
                continue;
            }

            let new_mapping = NewUrlMapping {
                original_url: raw_url.to_string(),
                normalized_url: normalized_url.clone(),
                short_code: code.clone(),
            };

            match self
                .with_deadline(self.repository.create(new_mapping))
                .await
            {
                Ok(mapping) => {
                    info!(code = %mapping.short_code, attempt, "Created short link");
                    return Ok(self.shortened(mapping, true));
                }
                Err(StoreError::UniqueViolation {
                    column: UniqueColumn::ShortCode,
                }) => {
                    debug!(attempt, %code, "Short code collision, retrying");
                }
                Err(StoreError::UniqueViolation {
                    column: UniqueColumn::NormalizedUrl,
                }) => {
                    return self.adopt_concurrent_winner(&normalized_url).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to persist short link");
                    return Err(e.into());
                }
            }
        }

        warn!(
            attempts = self.options.max_attempts,
            "Gave up allocating a short code"
        );
        Err(AppError::ExhaustedRetries {
            attempts: self.options.max_attempts,
        })
    }

    /// Returns the original URL for `code`, exactly as it was submitted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no mapping has this code.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        self.get_by_code(code)
            .await
            .map(|mapping| mapping.original_url)
    }

    /// Retrieves the full mapping for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no mapping has this code.
    pub async fn get_by_code(&self, code: &str) -> Result<UrlMapping, AppError> {
        self.with_deadline(self.repository.find_by_short_code(code))
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }

    /// Lists mappings, optionally filtered by a search term.
    pub async fn list(&self, filter: UrlMappingFilter) -> Result<ListPage, AppError> {
        let (items, total) = tokio::try_join!(
            self.with_deadline(self.repository.list(&filter)),
            self.with_deadline(self.repository.count(&filter))
        )?;

        Ok(ListPage { items, total })
    }

    /// Checks that the store answers within the deadline.
    pub async fn check_store(&self) -> Result<(), AppError> {
        self.with_deadline(self.repository.ping()).await?;
        Ok(())
    }

    /// Builds the short reference for `code`.
    pub fn short_reference(&self, code: &str) -> String {
        self.options.references.build(code)
    }

    /// Another writer inserted the same normalized URL between our lookup
    /// and our insert; its mapping is the answer.
    async fn adopt_concurrent_winner(&self, normalized_url: &str) -> Result<Shortened, AppError> {
        match self
            .with_deadline(self.repository.find_by_normalized_url(normalized_url))
            .await?
        {
            Some(winner) => {
                debug!(code = %winner.short_code, "Lost shorten race, returning winner");
                Ok(self.shortened(winner, false))
            }
            None => {
                error!(normalized_url, "Store rejected URL as duplicate but has no mapping for it");
                Err(AppError::internal(
                    "Store reported a duplicate URL that cannot be found",
                    json!({ "normalized_url": normalized_url }),
                ))
            }
        }
    }

    fn shortened(&self, mapping: UrlMapping, created: bool) -> Shortened {
        let short_reference = self.short_reference(&mapping.short_code);
        Shortened {
            mapping,
            short_reference,
            created,
        }
    }

    async fn with_deadline<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.options.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.options.store_timeout, "Store call timed out");
                Err(StoreError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlMappingRepository;
    use async_trait::async_trait;
    use chrono::Utc;

    const SEED: u64 = 7;

    fn persisted(new_mapping: NewUrlMapping) -> UrlMapping {
        UrlMapping::new(
            1,
            new_mapping.original_url,
            new_mapping.normalized_url,
            new_mapping.short_code,
            Utc::now(),
        )
    }

    fn existing(code: &str, original_url: &str) -> UrlMapping {
        UrlMapping::new(
            5,
            original_url.to_string(),
            normalize_url(original_url),
            code.to_string(),
            Utc::now(),
        )
    }

    fn service(repo: MockUrlMappingRepository) -> ShortenerService<MockUrlMappingRepository> {
        service_with(repo, ShortenerOptions::default())
    }

    fn service_with(
        repo: MockUrlMappingRepository,
        options: ShortenerOptions,
    ) -> ShortenerService<MockUrlMappingRepository> {
        ShortenerService::new(Arc::new(repo), CodeGenerator::seeded(SEED, 6), options)
    }

    fn expected_codes(n: usize) -> Vec<String> {
        let generator = CodeGenerator::seeded(SEED, 6);
        (0..n).map(|_| generator.generate().unwrap()).collect()
    }

    fn code_collision() -> StoreError {
        StoreError::UniqueViolation {
            column: UniqueColumn::ShortCode,
        }
    }

    #[tokio::test]
    async fn test_shorten_creates_mapping() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .withf(|normalized| normalized == "example.com/page?x=1")
            .times(1)
            .returning(|_| Ok(None));

        repo.expect_create()
            .withf(|new_mapping| {
                new_mapping.original_url == "https://example.com/page?x=1"
                    && new_mapping.normalized_url == "example.com/page?x=1"
                    && new_mapping.short_code.len() == 6
            })
            .times(1)
            .returning(|new_mapping| Ok(persisted(new_mapping)));

        let result = service(repo)
            .shorten("https://example.com/page?x=1")
            .await
            .unwrap();

        assert!(result.created);
        assert_eq!(result.mapping.original_url, "https://example.com/page?x=1");
        assert_eq!(result.mapping.normalized_url, "example.com/page?x=1");
        assert_eq!(result.mapping.short_code, expected_codes(1)[0]);
        assert_eq!(
            result.short_reference,
            format!("/jump/{}", result.mapping.short_code)
        );
    }

    #[tokio::test]
    async fn test_shorten_returns_existing_mapping() {
        let mut repo = MockUrlMappingRepository::new();

        let found = existing("abc123", "https://example.com/a");
        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        repo.expect_create().times(0);

        let result = service(repo)
            .shorten("HTTP://EXAMPLE.com/a")
            .await
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.mapping.short_code, "abc123");
        assert_eq!(result.short_reference, "/jump/abc123");
    }

    #[tokio::test]
    async fn test_shorten_invalid_url_never_touches_store() {
        let repo = MockUrlMappingRepository::new();
        let service = service(repo);

        for input in [
            "not-a-url",
            "",
            "ftp://example.com",
            "https://exa mple.com",
            " https://example.com",
            "https://example.com\n",
        ] {
            let result = service.shorten(input).await;
            assert!(
                matches!(result, Err(AppError::InvalidInput { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_shorten_retries_on_code_collision() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(|_| Ok(None));

        let mut calls = 0;
        repo.expect_create()
            .times(3)
            .returning(move |new_mapping| {
                calls += 1;
                if calls <= 2 {
                    Err(code_collision())
                } else {
                    Ok(persisted(new_mapping))
                }
            });

        let result = service(repo)
            .shorten("https://collision-test.com")
            .await
            .unwrap();

        assert!(result.created);
        assert_eq!(result.mapping.short_code, expected_codes(3)[2]);
    }

    #[tokio::test]
    async fn test_shorten_exhausts_retries() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(|_| Ok(None));

        repo.expect_create()
            .times(4)
            .returning(|_| Err(code_collision()));

        let options = ShortenerOptions {
            max_attempts: 4,
            ..ShortenerOptions::default()
        };

        let result = service_with(repo, options)
            .shorten("https://crowded.example.com")
            .await;

        assert!(matches!(
            result,
            Err(AppError::ExhaustedRetries { attempts: 4 })
        ));
    }

    #[tokio::test]
    async fn test_shorten_does_not_retry_backend_failure() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(|_| Ok(None));

        repo.expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Backend("connection reset".to_string())));

        let result = service(repo).shorten("https://example.com").await;

        assert!(matches!(
            result,
            Err(AppError::Storage(StoreError::Backend(_)))
        ));
    }

    #[tokio::test]
    async fn test_shorten_lookup_failure_is_fatal() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(|_| Err(StoreError::Backend("down".to_string())));

        repo.expect_create().times(0);

        let result = service(repo).shorten("https://example.com").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_shorten_normalized_url_race_returns_winner() {
        let mut repo = MockUrlMappingRepository::new();

        let winner = existing("w1nn3r", "https://race.example.com/");
        let mut lookups = 0;
        repo.expect_find_by_normalized_url()
            .times(2)
            .returning(move |_| {
                lookups += 1;
                if lookups == 1 {
                    Ok(None)
                } else {
                    Ok(Some(winner.clone()))
                }
            });

        repo.expect_create().times(1).returning(|_| {
            Err(StoreError::UniqueViolation {
                column: UniqueColumn::NormalizedUrl,
            })
        });

        let result = service(repo)
            .shorten("https://race.example.com/")
            .await
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.mapping.short_code, "w1nn3r");
    }

    #[tokio::test]
    async fn test_shorten_normalized_url_race_with_missing_winner() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .times(2)
            .returning(|_| Ok(None));

        repo.expect_create().times(1).returning(|_| {
            Err(StoreError::UniqueViolation {
                column: UniqueColumn::NormalizedUrl,
            })
        });

        let result = service(repo).shorten("https://ghost.example.com").await;
        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_shorten_precheck_skips_taken_codes() {
        let mut repo = MockUrlMappingRepository::new();
        let codes = expected_codes(2);

        repo.expect_find_by_normalized_url()
            .times(1)
            .returning(|_| Ok(None));

        let taken = codes[0].clone();
        repo.expect_exists_by_code()
            .times(2)
            .returning(move |code| Ok(code == taken));

        let second = codes[1].clone();
        repo.expect_create()
            .withf(move |new_mapping| new_mapping.short_code == second)
            .times(1)
            .returning(|new_mapping| Ok(persisted(new_mapping)));

        let options = ShortenerOptions {
            precheck_codes: true,
            ..ShortenerOptions::default()
        };

        let result = service_with(repo, options)
            .shorten("https://precheck.example.com")
            .await
            .unwrap();

        assert_eq!(result.mapping.short_code, codes[1]);
    }

    #[tokio::test]
    async fn test_shorten_uses_absolute_reference() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_normalized_url()
            .returning(|_| Ok(Some(existing("abc123", "https://example.com"))));

        let options = ShortenerOptions {
            references: ShortReferenceBuilder::absolute("https://s.example.com/"),
            ..ShortenerOptions::default()
        };

        let result = service_with(repo, options)
            .shorten("https://example.com")
            .await
            .unwrap();

        assert_eq!(result.short_reference, "https://s.example.com/jump/abc123");
    }

    #[tokio::test]
    async fn test_resolve_returns_original_url_unchanged() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_short_code()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(Some(existing("abc123", "https://Example.com/Path?Q=1#frag"))));

        let url = service(repo).resolve("abc123").await.unwrap();
        assert_eq!(url, "https://Example.com/Path?Q=1#frag");
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_find_by_short_code()
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create().times(0);

        let result = service(repo).resolve("doesnotexist").await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_combines_items_and_count() {
        let mut repo = MockUrlMappingRepository::new();

        repo.expect_list()
            .withf(|filter| filter.search.as_deref() == Some("example") && filter.limit == 10)
            .times(1)
            .returning(|_| Ok(vec![existing("abc123", "https://example.com")]));

        repo.expect_count().times(1).returning(|_| Ok(11));

        let page = service(repo)
            .list(UrlMappingFilter::new(0, 10).with_search(Some("example".to_string())))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 11);
    }

    struct StalledRepository;

    #[async_trait]
    impl UrlMappingRepository for StalledRepository {
        async fn find_by_normalized_url(
            &self,
            _normalized_url: &str,
        ) -> Result<Option<UrlMapping>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn find_by_short_code(&self, _code: &str) -> Result<Option<UrlMapping>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn create(&self, _new_mapping: NewUrlMapping) -> Result<UrlMapping, StoreError> {
            Err(StoreError::Backend("unreachable".to_string()))
        }

        async fn exists_by_code(&self, _code: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn list(&self, _filter: &UrlMappingFilter) -> Result<Vec<UrlMapping>, StoreError> {
            Ok(Vec::new())
        }

        async fn count(&self, _filter: &UrlMappingFilter) -> Result<i64, StoreError> {
            Ok(0)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_calls_are_bounded_by_deadline() {
        let options = ShortenerOptions {
            store_timeout: Duration::from_millis(100),
            ..ShortenerOptions::default()
        };
        let service = ShortenerService::new(
            Arc::new(StalledRepository),
            CodeGenerator::seeded(SEED, 6),
            options,
        );

        let result = service.shorten("https://slow.example.com").await;
        assert!(matches!(result, Err(AppError::Storage(StoreError::Timeout))));

        let result = service.resolve("abc123").await;
        assert!(matches!(result, Err(AppError::Storage(StoreError::Timeout))));
    }

    #[test]
    fn test_short_reference_builder() {
        assert_eq!(ShortReferenceBuilder::relative().build("abc123"), "/jump/abc123");
        assert_eq!(
            ShortReferenceBuilder::absolute("https://s.example.com").build("abc123"),
            "https://s.example.com/jump/abc123"
        );
        assert_eq!(
            ShortReferenceBuilder::absolute("https://s.example.com///").build("abc123"),
            "https://s.example.com/jump/abc123"
        );
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        let options = ShortenerOptions {
            max_attempts: 0,
            ..ShortenerOptions::default()
        };
        let service = service_with(MockUrlMappingRepository::new(), options);
        assert_eq!(service.options().max_attempts, 1);
    }
}
