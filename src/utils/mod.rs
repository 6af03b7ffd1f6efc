//! Leaf utilities used by the shortener engine.
//!
//! - [`url_normalizer`] - URL validation and canonicalization for deduplication
//! - [`code_generator`] - Short code generation from an injected random source

pub mod code_generator;
pub mod url_normalizer;
