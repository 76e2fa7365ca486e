//! Session
//!
//! The signed-in user and their bearer token, and the state machine that gates
//! protected views:
//!
//! ```text
//! Loading --restore--> Anonymous <--sign_in / sign_out--> Authenticated
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Where a freshly signed-in user lands when no redirect is pending.
pub const DEFAULT_LANDING_PATH: &str = "/userdashboard";

/// Profile of the signed-in user, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend account id
    pub id: u64,

    /// Login name
    pub username: String,

    /// Contact email
    pub email: String,

    /// Display name
    pub name: String,

    /// Platform administrator
    #[serde(default)]
    pub is_superuser: bool,

    /// Staff member
    #[serde(default)]
    pub is_staff: bool,

    /// KYC review status, e.g. `pending` or `approved`
    #[serde(default)]
    pub kyc_status: Option<String>,

    /// Whether the email address has been confirmed
    #[serde(default)]
    pub is_email_verified: bool,
}

impl UserProfile {
    /// Whether the user may open admin views.
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.is_staff
    }
}

/// Opaque bearer credential.
///
/// The value is redacted from `Debug` output and wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for request headers and durable storage.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(**redacted**)")
    }
}

impl Drop for AuthToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A signed-in user together with their credential.
///
/// Holding both in one value means a token never exists without a user, or
/// the other way round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: UserProfile,
    token: AuthToken,
}

impl Session {
    /// Pair a profile with its credential.
    pub fn new(user: UserProfile, token: AuthToken) -> Self {
        Self { user, token }
    }

    /// The signed-in user.
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// The bearer credential.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

/// Authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Stored credentials have not been read yet.
    #[default]
    Loading,

    /// Guest.
    Anonymous,

    /// Signed in.
    Authenticated(Session),
}

/// Outcome of checking access to a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Session state is still being restored; show a neutral waiting state.
    Waiting,

    /// Render the view for this session.
    Granted(&'a Session),

    /// Prompt for login. The requested path has been remembered.
    LoginRequired,
}

/// Holds the session state and the post-login redirect target.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: SessionState,
    redirect: Option<String>,
}

impl SessionStore {
    /// A store in the [`SessionState::Loading`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active session, if signed in.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    /// Whether stored credentials are still being read.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    /// Finish start-up with whatever session was found in durable storage.
    pub fn restore(&mut self, session: Option<Session>) {
        self.state = session.map_or(SessionState::Anonymous, SessionState::Authenticated);
    }

    /// Enter the authenticated state.
    ///
    /// Returns the path to navigate to: the pending redirect if there is one
    /// (which is consumed), otherwise [`DEFAULT_LANDING_PATH`].
    pub fn sign_in(&mut self, session: Session) -> String {
        self.state = SessionState::Authenticated(session);

        self.redirect
            .take()
            .unwrap_or_else(|| DEFAULT_LANDING_PATH.to_string())
    }

    /// Return to the anonymous state.
    pub fn sign_out(&mut self) {
        self.state = SessionState::Anonymous;
    }

    /// Remember where to go after the next sign-in.
    pub fn set_redirect(&mut self, path: impl Into<String>) {
        self.redirect = Some(path.into());
    }

    /// The pending post-login destination.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Check access to a protected view at `requested_path`.
    pub fn guard(&mut self, requested_path: &str) -> Access<'_> {
        match &self.state {
            SessionState::Loading => Access::Waiting,
            SessionState::Authenticated(session) => Access::Granted(session),
            SessionState::Anonymous => {
                self.redirect = Some(requested_path.to_string());

                Access::LoginRequired
            }
        }
    }
}
