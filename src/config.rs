//! Runtime configuration shared by the server and CLI binaries

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::error::{CalendarError, Result};
use crate::google::DEFAULT_API_BASE_URL;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Command-line flags, each with an environment fallback
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// OAuth client secrets file downloaded from the Google Cloud console
    #[arg(long, env = "CLIENT_SECRET_PATH")]
    pub client_secret_path: Option<String>,

    /// Where the OAuth token is stored
    #[arg(long, env = "TOKEN_PATH")]
    pub token_path: Option<String>,

    /// Calendar API base URL
    #[arg(long, env = "GCAL_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Seconds to wait for the OAuth consent redirect
    #[arg(long, env = "GCAL_AUTH_TIMEOUT_SECS", default_value = "300")]
    pub auth_timeout_secs: u64,

    /// Log format written to stderr
    #[arg(long, env = "GCAL_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
    pub api_base_url: String,
    pub auth_timeout: Duration,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let client_secret_path = required_path(
            args.client_secret_path,
            "--client-secret-path",
            "CLIENT_SECRET_PATH",
        )?;
        let token_path = required_path(args.token_path, "--token-path", "TOKEN_PATH")?;

        if args.auth_timeout_secs == 0 {
            return Err(CalendarError::Config(
                "auth timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            client_secret_path,
            token_path,
            api_base_url: args.api_base_url,
            auth_timeout: Duration::from_secs(args.auth_timeout_secs),
            log_format: args.log_format,
        })
    }
}

/// Install the global subscriber. Logs go to stderr; stdout carries the
/// MCP protocol.
pub fn init_logging(format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn required_path(value: Option<String>, flag: &str, env: &str) -> Result<PathBuf> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => Ok(PathBuf::from(shellexpand::tilde(&v).into_owned())),
        None => Err(CalendarError::Config(format!(
            "{flag} (or the {env} environment variable) is required"
        ))),
    }
}
