//! Application configuration

use std::{path::PathBuf, time::Duration};

use clap::Args;

use crate::api::{ApiConfig, DEFAULT_API_URL};

/// Where the session is kept when no path is configured.
pub const DEFAULT_SESSION_FILE: &str = ".investomart/session.json";

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Backend connection settings.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// Marketplace API root
    #[arg(long, env = "INVESTOMART_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "INVESTOMART_HTTP_TIMEOUT", default_value_t = 30_u64, global = true)]
    pub http_timeout: u64,
}

impl BackendConfig {
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.http_timeout),
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Args)]
pub struct SessionConfig {
    /// File holding the signed-in session between runs
    #[arg(long, env = "INVESTOMART_SESSION_FILE", default_value = DEFAULT_SESSION_FILE, global = true)]
    pub session_file: PathBuf,
}

/// Settings shared by every command.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Backend connection settings.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Session persistence settings.
    #[command(flatten)]
    pub session: SessionConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
