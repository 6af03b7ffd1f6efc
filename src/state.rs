//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::ShortenerService;
use crate::infrastructure::cache::CacheService;

/// Application state, cheap to clone (all fields are `Arc`s).
#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<ShortenerService>,
    pub cache: Arc<dyn CacheService>,
}

impl AppState {
    pub fn new(shortener: Arc<ShortenerService>, cache: Arc<dyn CacheService>) -> Self {
        Self { shortener, cache }
    }
}
