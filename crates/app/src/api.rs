//! REST backend client and error classification.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, error};

/// Default backend address used by the reference deployment.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Configuration for connecting to the marketplace backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, e.g. `"http://localhost:8000/api"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client bound to the backend API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Absolute URL for an API path such as `"search/explore/"`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a GET request.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// Start a POST request.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Send a request and decode a JSON body from a successful response.
    ///
    /// `context` names the calling operation in logs.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`] when no response arrives, the backend
    /// answers with a non-2xx status, or the body does not decode.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, context).await?;

        response.json().await.map_err(|source| {
            error!(context, error = %source, "failed to decode response body");

            ApiError::Decode(source)
        })
    }

    /// Send a request, discarding any successful body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send_json`].
    pub async fn send_empty(&self, request: RequestBuilder, context: &str) -> Result<(), ApiError> {
        self.send(request, context).await.map(drop)
    }

    /// Send a request and hand back the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] when no response arrives.
    pub async fn execute(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| {
            error!(context, error = %source, "no response from server");

            ApiError::Network(source)
        })?;

        debug!(context, status = %response.status(), url = %response.url(), "backend responded");

        Ok(response)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response, ApiError> {
        let response = self.execute(request, context).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status, &text);

        error!(context, %status, body = %text, "backend returned an error");

        Err(error)
    }
}

/// A field-level validation failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Classified failure of a backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("no response from server")]
    Network(#[source] reqwest::Error),

    /// The backend rejected the credentials (401).
    #[error("{message}")]
    Authentication { message: String },

    /// The backend rejected the input (400).
    #[error("{message}")]
    Validation {
        message: String,
        fields: SmallVec<[FieldError; 4]>,
    },

    /// Any other non-2xx response.
    #[error("{message} (status {status})")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("unexpected response body")]
    Decode(#[source] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Classify a non-2xx response from its status and raw body.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let body: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = body.error;

        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication {
                message: message.unwrap_or_else(|| "Unauthorized".to_string()),
            },
            StatusCode::BAD_REQUEST => Self::Validation {
                message: message.unwrap_or_else(|| "Validation failed".to_string()),
                fields: body.fields.map(field_errors).unwrap_or_default(),
            },
            _ => Self::Api {
                status,
                message: message.unwrap_or_else(|| "Server error".to_string()),
                code: body.code,
            },
        }
    }

    /// HTTP status of the failed response, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Validation { .. } => Some(StatusCode::BAD_REQUEST),
            Self::Api { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) | Self::Client(_) => None,
        }
    }

    /// Message suitable for an inline banner or toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { .. } => "Authentication failed. Please login again.".to_string(),
            Self::Network(_) => "Network error. Please check your connection.".to_string(),
            Self::Validation { message, .. } | Self::Api { message, .. } => message.clone(),
            Self::Decode(_) | Self::Client(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    code: Option<String>,

    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

fn field_errors(fields: Map<String, Value>) -> SmallVec<[FieldError; 4]> {
    fields
        .into_iter()
        .map(|(field, value)| {
            let message = match value {
                Value::String(message) => message,
                Value::Array(messages) => messages
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };

            FieldError { field, message }
        })
        .collect()
}
