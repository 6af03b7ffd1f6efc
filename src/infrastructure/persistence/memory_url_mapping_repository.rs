//! In-memory implementation of the URL mapping store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::entities::{NewUrlMapping, UrlMapping};
use crate::domain::repositories::{
    StoreError, UniqueColumn, UrlMappingFilter, UrlMappingRepository,
};

#[derive(Default)]
struct Tables {
    rows: Vec<UrlMapping>,
    by_code: HashMap<String, usize>,
    by_normalized_url: HashMap<String, usize>,
}

/// Process-local store with the same uniqueness guarantees as the SQL table.
///
/// Both constraints are checked and the row is written under one write lock,
/// so `create` is all-or-nothing. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUrlMappingRepository {
    tables: RwLock<Tables>,
}

impl InMemoryUrlMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching<'a>(
        tables: &'a Tables,
        filter: &'a UrlMappingFilter,
    ) -> impl DoubleEndedIterator<Item = &'a UrlMapping> + 'a {
        tables.rows.iter().filter(move |mapping| {
            filter
                .search
                .as_deref()
                .is_none_or(|term| mapping.matches_search(term))
        })
    }
}

#[async_trait]
impl UrlMappingRepository for InMemoryUrlMappingRepository {
    async fn find_by_normalized_url(
        &self,
        normalized_url: &str,
    ) -> Result<Option<UrlMapping>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .by_normalized_url
            .get(normalized_url)
            .map(|&idx| tables.rows[idx].clone()))
    }

    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlMapping>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.by_code.get(code).map(|&idx| tables.rows[idx].clone()))
    }

    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        if tables.by_code.contains_key(&new_mapping.short_code) {
            return Err(StoreError::UniqueViolation {
                column: UniqueColumn::ShortCode,
            });
        }

        if tables
            .by_normalized_url
            .contains_key(&new_mapping.normalized_url)
        {
            return Err(StoreError::UniqueViolation {
                column: UniqueColumn::NormalizedUrl,
            });
        }

        let idx = tables.rows.len();
        let mapping = UrlMapping::new(
            idx as i64 + 1,
            new_mapping.original_url,
            new_mapping.normalized_url,
            new_mapping.short_code,
            Utc::now(),
        );

        tables.by_code.insert(mapping.short_code.clone(), idx);
        tables
            .by_normalized_url
            .insert(mapping.normalized_url.clone(), idx);
        tables.rows.push(mapping.clone());

        Ok(mapping)
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.by_code.contains_key(code))
    }

    async fn list(&self, filter: &UrlMappingFilter) -> Result<Vec<UrlMapping>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);

        // Rows are appended in creation order, so reversing yields newest first.
        Ok(Self::matching(&tables, filter)
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UrlMappingFilter) -> Result<i64, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::matching(&tables, filter).count() as i64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
