#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jumplink::application::services::{ShortReferenceBuilder, ShortenerOptions, ShortenerService};
use jumplink::domain::entities::{NewUrlMapping, UrlMapping};
use jumplink::domain::repositories::{StoreError, UrlMappingFilter, UrlMappingRepository};
use jumplink::infrastructure::cache::{CacheResult, CacheService, NullCache};
use jumplink::infrastructure::persistence::InMemoryUrlMappingRepository;
use jumplink::routes::router;
use jumplink::state::AppState;
use jumplink::utils::code_generator::CodeGenerator;

pub const BASE_URL: &str = "https://jmp.test";

pub fn test_options() -> ShortenerOptions {
    ShortenerOptions {
        references: ShortReferenceBuilder::absolute(BASE_URL),
        ..ShortenerOptions::default()
    }
}

pub fn create_test_state(
    repository: Arc<dyn UrlMappingRepository>,
    cache: Arc<dyn CacheService>,
) -> AppState {
    let shortener = ShortenerService::new(repository, CodeGenerator::system(6), test_options());
    AppState::new(Arc::new(shortener), cache)
}

/// Full router over an empty in-memory store and a disabled cache.
pub fn create_test_server() -> (TestServer, Arc<InMemoryUrlMappingRepository>) {
    let repository = Arc::new(InMemoryUrlMappingRepository::new());
    let state = create_test_state(repository.clone(), Arc::new(NullCache::new()));
    (server_for(state), repository)
}

pub fn server_for(state: AppState) -> TestServer {
    TestServer::new(router(state)).unwrap()
}

pub async fn insert_mapping(
    repository: &InMemoryUrlMappingRepository,
    url: &str,
    normalized: &str,
    code: &str,
) -> UrlMapping {
    repository
        .create(NewUrlMapping {
            original_url: url.to_string(),
            normalized_url: normalized.to_string(),
            short_code: code.to_string(),
        })
        .await
        .unwrap()
}

/// Cache backed by a map, to observe what the redirect handler stores.
pub struct MemoryCache {
    pub entries: Mutex<HashMap<String, String>>,
    pub healthy: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            healthy: false,
        }
    }

    pub fn insert(&self, code: &str, url: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(code.to_string(), url.to_string());
    }

    pub fn get(&self, code: &str) -> Option<String> {
        self.entries.lock().unwrap().get(code).cloned()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        Ok(self.get(short_code))
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        self.insert(short_code, original_url);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Store whose every call fails with a backend error.
pub struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl UrlMappingRepository for BrokenStore {
    async fn find_by_normalized_url(
        &self,
        _normalized_url: &str,
    ) -> Result<Option<UrlMapping>, StoreError> {
        Err(broken())
    }

    async fn find_by_short_code(&self, _code: &str) -> Result<Option<UrlMapping>, StoreError> {
        Err(broken())
    }

    async fn create(&self, _new_mapping: NewUrlMapping) -> Result<UrlMapping, StoreError> {
        Err(broken())
    }

    async fn exists_by_code(&self, _code: &str) -> Result<bool, StoreError> {
        Err(broken())
    }

    async fn list(&self, _filter: &UrlMappingFilter) -> Result<Vec<UrlMapping>, StoreError> {
        Err(broken())
    }

    async fn count(&self, _filter: &UrlMappingFilter) -> Result<i64, StoreError> {
        Err(broken())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(broken())
    }
}
