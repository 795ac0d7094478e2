//! gcal-mcp CLI
//!
//! Operator commands for setting up and checking OAuth credentials outside
//! an MCP session.

use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};

use gcal_mcp::auth::{Authenticator, ClientSecrets, TokenStore};
use gcal_mcp::config::{init_logging, ConfigArgs, LogFormat, ServerConfig};
use gcal_mcp::error::{CalendarError, Result};
use gcal_mcp::mcp::get_tool_definitions;

#[derive(Parser)]
#[command(name = "gcal-mcp-cli")]
#[command(about = "Google Calendar MCP operator CLI")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the OAuth consent flow now and store the token
    Auth {
        /// Authorize even if a valid token is stored
        #[arg(short, long)]
        force: bool,
    },
    /// Show the stored token's expiry and scope
    TokenStatus,
    /// Print the MCP tool catalogue as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tools => {
            let tools = get_tool_definitions();
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
        Commands::TokenStatus => {
            let token_path = cli
                .config
                .token_path
                .as_deref()
                .map(|p| shellexpand::tilde(p).into_owned())
                .ok_or_else(|| {
                    CalendarError::Config(
                        "--token-path (or the TOKEN_PATH environment variable) is required"
                            .to_string(),
                    )
                })?;
            let store = TokenStore::new(token_path);
            match store.load() {
                None => println!("No token stored at {}", store.path().display()),
                Some(token) => {
                    let expiry = token
                        .expiry_date
                        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string());
                    println!("Token file: {}", store.path().display());
                    println!("Expires:    {}", expiry);
                    println!(
                        "Status:     {}",
                        if token.is_expired() { "expired" } else { "valid" }
                    );
                    println!(
                        "Refresh:    {}",
                        if token.refresh_token.is_some() { "yes" } else { "no" }
                    );
                    println!("Scope:      {}", token.scope);
                }
            }
            Ok(())
        }
        Commands::Auth { force } => {
            init_logging(LogFormat::Text);
            let config = ServerConfig::from_args(cli.config)?;
            let secrets = ClientSecrets::load(&config.client_secret_path)?;
            let authenticator = Authenticator::new(secrets, TokenStore::new(&config.token_path))
                .with_callback_timeout(config.auth_timeout);

            let token = if force {
                authenticator.authorize_interactively().await?
            } else {
                authenticator.ensure_authenticated().await?
            };
            println!(
                "Authorized; token stored at {} (refresh token: {})",
                authenticator.store().path().display(),
                if token.refresh_token.is_some() { "yes" } else { "no" }
            );
            Ok(())
        }
    }
}
