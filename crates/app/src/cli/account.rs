use std::io::{self, Write};

use clap::Args;
use investomart::session::SessionState;
use investomart_app::{
    auth::{AuthServiceError, Credentials, Registration},
    context::AppContext,
    session::SessionManager,
};

use super::{output, output_error};

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    /// Account email
    #[arg(long, required_unless_present = "google_token")]
    email: Option<String>,

    /// Account password
    #[arg(
        long,
        env = "INVESTOMART_PASSWORD",
        hide_env_values = true,
        required_unless_present = "google_token"
    )]
    password: Option<String>,

    /// Google ID token to sign in with instead of a password
    #[arg(long, conflicts_with_all = ["email", "password"])]
    google_token: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct RegisterArgs {
    /// Account email
    #[arg(long)]
    email: String,

    /// Account password
    #[arg(long, env = "INVESTOMART_PASSWORD", hide_env_values = true)]
    password: String,

    /// Display name
    #[arg(long)]
    name: String,
}

async fn manager(app: &AppContext) -> SessionManager {
    let mut manager = app.session_manager();

    manager.initialize().await;

    manager
}

pub(crate) async fn login(app: &AppContext, args: LoginArgs) -> Result<(), String> {
    let mut manager = manager(app).await;

    let result = match (args.google_token, args.email, args.password) {
        (Some(token), _, _) => manager.sign_in_with_google(token).await,
        (None, Some(email), Some(password)) => {
            manager.sign_in(Credentials { email, password }).await
        }
        _ => return Err("email and password are required".to_string()),
    };

    let target = result.map_err(|error| auth_failure(&error))?;

    signed_in(&manager, &target)
}

pub(crate) async fn register(app: &AppContext, args: RegisterArgs) -> Result<(), String> {
    let mut manager = manager(app).await;

    let target = manager
        .register(Registration {
            email: args.email,
            password: args.password,
            name: args.name,
        })
        .await
        .map_err(|error| auth_failure(&error))?;

    signed_in(&manager, &target)
}

pub(crate) async fn logout(app: &AppContext) -> Result<(), String> {
    let mut manager = manager(app).await;
    let was_signed_in = manager.session().is_some();

    manager.logout().await;

    let message = if was_signed_in {
        "Signed out."
    } else {
        "Not signed in."
    };

    writeln!(io::stdout(), "{message}").map_err(output_error)
}

pub(crate) async fn whoami(app: &AppContext) -> Result<(), String> {
    let manager = manager(app).await;
    let mut out = io::stdout().lock();

    match manager.state() {
        SessionState::Authenticated(session) => {
            output::write_profile(&mut out, session.user()).map_err(output_error)
        }
        SessionState::Loading | SessionState::Anonymous => {
            writeln!(out, "Not signed in.").map_err(output_error)
        }
    }
}

fn signed_in(manager: &SessionManager, target: &str) -> Result<(), String> {
    let name = manager
        .session()
        .map_or("", |session| session.user().name.as_str());

    writeln!(io::stdout(), "Signed in as {name}. Continue at {target}.").map_err(output_error)
}

fn auth_failure(error: &AuthServiceError) -> String {
    match error {
        AuthServiceError::Validation { message, fields } if !fields.is_empty() => {
            let details: Vec<String> = fields
                .iter()
                .map(|field| format!("  {}: {}", field.field, field.message))
                .collect();

            format!("{message}\n{}", details.join("\n"))
        }
        other => other.user_message(),
    }
}
