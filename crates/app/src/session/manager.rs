//! Session lifecycle.

use std::{fmt, sync::Arc};

use investomart::session::{
    Access, AuthToken, Session, SessionState, SessionStore, UserProfile,
};
use tracing::{info, warn};

use crate::{
    auth::{AuthService, AuthServiceError, Credentials, Registration},
    session::{SessionStorage, TOKEN_KEY, USER_KEY},
};

/// Owns the session state of the running application and keeps durable
/// storage in step with it.
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    storage: Arc<dyn SessionStorage>,
    store: SessionStore,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// A manager in the loading state. Call [`SessionManager::initialize`]
    /// before gating anything on it.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthService>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            auth,
            storage,
            store: SessionStore::new(),
        }
    }

    /// Restore the session saved by a previous run.
    ///
    /// Both the user record and the token must be present and the user record
    /// must parse; anything else starts anonymous.
    pub async fn initialize(&mut self) {
        let session = self.read_stored_session().await;

        if let Some(session) = &session {
            info!(user_id = session.user().id, "restored stored session");
        }

        self.store.restore(session);
    }

    async fn read_stored_session(&self) -> Option<Session> {
        let user = self.read_key(USER_KEY).await?;
        let token = self.read_key(TOKEN_KEY).await?;

        match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) => Some(Session::new(user, AuthToken::new(token))),
            Err(error) => {
                warn!(%error, "stored user record is malformed, starting signed out");

                None
            }
        }
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "failed to read stored session");

                None
            }
        }
    }

    /// Enter the authenticated state with a session issued by the backend.
    ///
    /// Returns where to navigate next. Failing to persist the session is
    /// logged and does not undo the sign-in.
    pub async fn login(&mut self, session: Session) -> String {
        match serde_json::to_string(session.user()) {
            Ok(user) => self.write_key(USER_KEY, &user).await,
            Err(error) => warn!(%error, "failed to encode user record"),
        }

        self.write_key(TOKEN_KEY, session.token().expose()).await;

        info!(user_id = session.user().id, "session started");

        self.store.sign_in(session)
    }

    async fn write_key(&self, key: &str, value: &str) {
        if let Err(error) = self.storage.set(key, value).await {
            warn!(key, %error, "failed to persist session");
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection; the state is left unchanged.
    pub async fn sign_in(&mut self, credentials: Credentials) -> Result<String, AuthServiceError> {
        let session = self.auth.login(credentials).await?;

        Ok(self.login(session).await)
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection; the state is left unchanged.
    pub async fn register(
        &mut self,
        registration: Registration,
    ) -> Result<String, AuthServiceError> {
        let session = self.auth.register(registration).await?;

        Ok(self.login(session).await)
    }

    /// Sign in with a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection; the state is left unchanged.
    pub async fn sign_in_with_google(
        &mut self,
        id_token: String,
    ) -> Result<String, AuthServiceError> {
        let session = self.auth.google(id_token).await?;

        Ok(self.login(session).await)
    }

    /// End the session.
    ///
    /// The backend is notified on a best-effort basis. Memory and durable
    /// storage are cleared whatever the backend says.
    pub async fn logout(&mut self) {
        if let Some(session) = self.store.session()
            && let Err(error) = self.auth.logout(session.token()).await
        {
            warn!(%error, "backend logout failed, clearing local session anyway");
        }

        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(error) = self.storage.remove(key).await {
                warn!(key, %error, "failed to clear stored session");
            }
        }

        self.store.sign_out();

        info!("session ended");
    }

    /// Check access to a protected path, remembering it when login is required.
    pub fn guard(&mut self, path: &str) -> Access<'_> {
        self.store.guard(path)
    }

    /// The active session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.store.session()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    /// Whether stored credentials are still being read.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use mockall::predicate::always;
    use reqwest::StatusCode;
    use testresult::TestResult;

    use tempfile::TempDir;

    use crate::{
        api::ApiError,
        auth::{HttpAuthService, MockAuthService},
        session::{
            FileSessionStorage, MemorySessionStorage, MockSessionStorage, SessionStorageError,
        },
        test::{TEST_TOKEN, TestBackend, session},
    };

    use super::*;

    fn manager(auth: MockAuthService, storage: Arc<dyn SessionStorage>) -> SessionManager {
        SessionManager::new(Arc::new(auth), storage)
    }

    async fn stored(storage: &MemorySessionStorage, key: &str) -> TestResult<Option<String>> {
        Ok(storage.get(key).await?)
    }

    #[tokio::test]
    async fn empty_storage_starts_anonymous() {
        let mut manager = manager(MockAuthService::new(), Arc::new(MemorySessionStorage::new()));

        assert!(manager.is_loading());

        manager.initialize().await;

        assert_eq!(manager.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn stored_user_and_token_restore_the_session() -> TestResult {
        let storage = Arc::new(MemorySessionStorage::new());
        let expected = session();

        storage
            .set(USER_KEY, &serde_json::to_string(expected.user())?)
            .await?;
        storage.set(TOKEN_KEY, TEST_TOKEN).await?;

        let mut manager = manager(MockAuthService::new(), storage);

        manager.initialize().await;

        assert_eq!(manager.session(), Some(&expected));

        Ok(())
    }

    #[tokio::test]
    async fn token_without_user_starts_anonymous() -> TestResult {
        let storage = Arc::new(MemorySessionStorage::new());

        storage.set(TOKEN_KEY, TEST_TOKEN).await?;

        let mut manager = manager(MockAuthService::new(), storage);

        manager.initialize().await;

        assert_eq!(manager.state(), &SessionState::Anonymous);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_user_record_starts_anonymous() -> TestResult {
        let storage = Arc::new(MemorySessionStorage::new());

        storage.set(USER_KEY, "{not json").await?;
        storage.set(TOKEN_KEY, TEST_TOKEN).await?;

        let mut manager = manager(MockAuthService::new(), storage);

        manager.initialize().await;

        assert_eq!(manager.state(), &SessionState::Anonymous);

        Ok(())
    }

    #[tokio::test]
    async fn login_persists_user_and_token() -> TestResult {
        let storage = Arc::new(MemorySessionStorage::new());
        let mut manager = manager(MockAuthService::new(), storage.clone());

        manager.initialize().await;

        let target = manager.login(session()).await;

        assert_eq!(target, "/userdashboard");
        assert_eq!(stored(&storage, TOKEN_KEY).await?.as_deref(), Some(TEST_TOKEN));
        assert!(stored(&storage, USER_KEY).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn login_returns_to_the_guarded_path() {
        let mut manager = manager(MockAuthService::new(), Arc::new(MemorySessionStorage::new()));

        manager.initialize().await;

        assert_eq!(manager.guard("/checkout"), Access::LoginRequired);
        assert_eq!(manager.login(session()).await, "/checkout");
    }

    #[tokio::test]
    async fn guard_waits_until_initialized() {
        let mut manager = manager(MockAuthService::new(), Arc::new(MemorySessionStorage::new()));

        assert_eq!(manager.guard("/cart"), Access::Waiting);
    }

    #[tokio::test]
    async fn storage_failure_does_not_block_login() {
        let mut storage = MockSessionStorage::new();

        storage.expect_set().returning(|_, _| {
            Err(SessionStorageError::Write {
                path: "session.json".into(),
                source: io::Error::other("disk full"),
            })
        });

        let mut manager = manager(MockAuthService::new(), Arc::new(storage));

        manager.login(session()).await;

        assert!(manager.session().is_some());
    }

    #[tokio::test]
    async fn logout_clears_everything_even_when_backend_fails() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_logout().with(always()).times(1).returning(|_| {
            Err(AuthServiceError::Api(ApiError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Logout failed".to_string(),
                code: None,
            }))
        });

        let storage = Arc::new(MemorySessionStorage::new());
        let mut manager = manager(auth, storage.clone());

        manager.login(session()).await;
        manager.logout().await;

        assert_eq!(manager.state(), &SessionState::Anonymous);
        assert_eq!(stored(&storage, USER_KEY).await?, None);
        assert_eq!(stored(&storage, TOKEN_KEY).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn backend_logout_failure_still_clears_the_session_file() -> TestResult {
        let backend = TestBackend::spawn().await?;
        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");

        backend.state.fail_logout();

        let auth = Arc::new(HttpAuthService::new(backend.client()?));
        let mut manager = SessionManager::new(auth, Arc::new(FileSessionStorage::new(&path)));

        manager.initialize().await;
        manager.login(session()).await;
        manager.logout().await;

        assert_eq!(backend.state.logout_calls(), 1);
        assert_eq!(manager.state(), &SessionState::Anonymous);

        let contents = std::fs::read_to_string(&path)?;

        assert!(!contents.contains(TEST_TOKEN), "token left on disk: {contents}");

        Ok(())
    }

    #[tokio::test]
    async fn corrupted_session_file_is_replaced_on_login() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");

        std::fs::write(&path, r#"{"token": "7-sita", broken"#)?;

        let storage = || Arc::new(FileSessionStorage::new(&path));
        let mut first = manager(MockAuthService::new(), storage());

        first.initialize().await;

        assert_eq!(first.state(), &SessionState::Anonymous);

        first.login(session()).await;

        let mut next_run = manager(MockAuthService::new(), storage());

        next_run.initialize().await;

        assert_eq!(next_run.session(), Some(&session()));

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_logout_skips_the_backend() {
        let mut auth = MockAuthService::new();

        auth.expect_logout().never();

        let mut manager = manager(auth, Arc::new(MemorySessionStorage::new()));

        manager.initialize().await;
        manager.logout().await;

        assert_eq!(manager.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn rejected_sign_in_leaves_state_unchanged() {
        let mut auth = MockAuthService::new();

        auth.expect_login().returning(|_| {
            Err(AuthServiceError::InvalidCredentials {
                message: "Invalid credentials".to_string(),
            })
        });

        let mut manager = manager(auth, Arc::new(MemorySessionStorage::new()));

        manager.initialize().await;

        let result = manager
            .sign_in(Credentials {
                email: "sita@example.com".to_string(),
                password: "guess".to_string(),
            })
            .await;

        assert!(result.is_err(), "expected sign-in to fail");
        assert_eq!(manager.state(), &SessionState::Anonymous);
    }
}
