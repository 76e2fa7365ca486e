//! Catalog search and detail lookups

mod errors;
mod service;

pub use errors::CatalogServiceError;
pub use service::*;
