//! Auth service.

use async_trait::async_trait;
use investomart::session::{AuthToken, Session};
use mockall::automock;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    api::ApiClient,
    auth::{AuthResponse, AuthServiceError, Credentials, Registration},
};

#[derive(Debug, Clone)]
pub struct HttpAuthService {
    api: ApiClient,
}

impl HttpAuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<Session, AuthServiceError> {
        let request = self.api.post(path).json(body);
        let response: AuthResponse = self.api.send_json(request, context).await?;

        info!(user_id = response.user.id, context, "signed in");

        Ok(response.into())
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthServiceError> {
        self.authenticate("auth/login/", &credentials, "login")
            .await
    }

    async fn register(&self, registration: Registration) -> Result<Session, AuthServiceError> {
        self.authenticate("auth/register/", &registration, "register")
            .await
    }

    async fn google(&self, id_token: String) -> Result<Session, AuthServiceError> {
        self.authenticate("auth/google/", &json!({ "token": id_token }), "google sign-in")
            .await
    }

    async fn logout(&self, token: &AuthToken) -> Result<(), AuthServiceError> {
        let request = self
            .api
            .post("auth/logout/")
            .header("Authorization", format!("Token {}", token.expose()))
            .json(&json!({}));

        Ok(self.api.send_empty(request, "logout").await?)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange email and password for a session.
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthServiceError>;

    /// Create an account and sign it in.
    async fn register(&self, registration: Registration) -> Result<Session, AuthServiceError>;

    /// Exchange a Google ID token for a session.
    async fn google(&self, id_token: String) -> Result<Session, AuthServiceError>;

    /// Tell the backend the session is over.
    async fn logout(&self, token: &AuthToken) -> Result<(), AuthServiceError>;
}
