//! Core domain entities.
//!
//! A [`UrlMapping`] is the only persisted entity. Creation goes through the
//! separate [`NewUrlMapping`] payload; the store assigns `id` and timestamps.

pub mod url_mapping;

pub use url_mapping::{NewUrlMapping, UrlMapping};
