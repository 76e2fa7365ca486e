//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    api::{ApiClient, ApiError},
    auth::{AuthService, HttpAuthService},
    catalog::{CatalogService, HttpCatalogService},
    chatbot::{ChatController, ChatService, HttpChatService},
    checkout::{CheckoutService, HttpPaymentsService, PaymentsService},
    config::AppConfig,
    search::SuggestionDebouncer,
    session::{FileSessionStorage, SessionManager, SessionStorage},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build backend client")]
    Client(#[source] ApiError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub auth: Arc<dyn AuthService>,
    pub payments: Arc<dyn PaymentsService>,
    pub chat: Arc<dyn ChatService>,
    pub session_storage: Arc<dyn SessionStorage>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let api = ApiClient::new(config.backend.api_config()).map_err(AppInitError::Client)?;

        Ok(Self {
            catalog: Arc::new(HttpCatalogService::new(api.clone())),
            auth: Arc::new(HttpAuthService::new(api.clone())),
            payments: Arc::new(HttpPaymentsService::new(api.clone())),
            chat: Arc::new(HttpChatService::new(api)),
            session_storage: Arc::new(FileSessionStorage::new(&config.session.session_file)),
        })
    }

    /// A session manager over the configured storage. It starts in the loading
    /// state.
    #[must_use]
    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(Arc::clone(&self.auth), Arc::clone(&self.session_storage))
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(Arc::clone(&self.payments))
    }

    #[must_use]
    pub fn chat_controller(&self) -> ChatController {
        ChatController::new(Arc::clone(&self.chat))
    }

    #[must_use]
    pub fn suggestions(&self) -> SuggestionDebouncer {
        SuggestionDebouncer::new(Arc::clone(&self.catalog))
    }
}
