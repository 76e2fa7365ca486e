//! Catalog service errors.

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("listing not found")]
    NotFound,

    #[error("failed to load listings")]
    Api(#[source] ApiError),
}

impl From<ApiError> for CatalogServiceError {
    fn from(error: ApiError) -> Self {
        if error.status() == Some(StatusCode::NOT_FOUND) {
            return Self::NotFound;
        }

        Self::Api(error)
    }
}
