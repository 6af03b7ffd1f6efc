//! Store contract for the domain layer.
//!
//! [`UrlMappingRepository`] is the only seam between the shortener and its
//! persistence engine. Implementations live in
//! `crate::infrastructure::persistence`; a `mockall` mock is generated for
//! unit tests.
//!
//! The store, not the engine, is the authority on uniqueness: `create` must
//! reject a duplicate `short_code` or `normalized_url` atomically and report
//! which column collided through [`StoreError::UniqueViolation`].

pub mod url_mapping_repository;

pub use url_mapping_repository::{
    StoreError, UniqueColumn, UrlMappingFilter, UrlMappingRepository,
};

#[cfg(test)]
pub use url_mapping_repository::MockUrlMappingRepository;
