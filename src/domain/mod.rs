//! Domain layer containing the persisted entity and the store contract.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business rules live in [`crate::application::services`]; the
//! store implementations live in [`crate::infrastructure::persistence`].
//!
//! - [`entities`] - [`entities::UrlMapping`] and its insert payload
//! - [`repositories`] - the [`repositories::UrlMappingRepository`] store trait

pub mod entities;
pub mod repositories;
