//! Application layer services implementing business logic.
//!
//! Services consume the store trait from [`crate::domain::repositories`] and
//! expose a small API to the HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::shortener_service::ShortenerService`] - shorten, resolve and list

pub mod services;
