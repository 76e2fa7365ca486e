//! Auth service errors.

use thiserror::Error;

use crate::api::{ApiError, FieldError};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("{message}")]
    InvalidCredentials { message: String },

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("authentication request failed")]
    Api(#[source] ApiError),
}

impl AuthServiceError {
    /// Message suitable for the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials { message } | Self::Validation { message, .. } => {
                message.clone()
            }
            Self::Api(error) => error.user_message(),
        }
    }
}

impl From<ApiError> for AuthServiceError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Authentication { message } => Self::InvalidCredentials { message },
            ApiError::Validation { message, fields } => Self::Validation {
                message,
                fields: fields.into_vec(),
            },
            other => Self::Api(other),
        }
    }
}
