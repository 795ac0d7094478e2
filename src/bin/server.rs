//! Google Calendar MCP Server
//!
//! Run with: gcal-mcp-server --client-secret-path <file> --token-path <file>

use std::sync::Arc;

use clap::Parser;

use gcal_mcp::auth::{Authenticator, ClientSecrets, TokenStore};
use gcal_mcp::config::{init_logging, ConfigArgs, ServerConfig};
use gcal_mcp::error::Result;
use gcal_mcp::google::GoogleCalendarClient;
use gcal_mcp::mcp::{CalendarHandler, McpServer};

#[derive(Parser, Debug)]
#[command(name = "gcal-mcp-server")]
#[command(about = "Google Calendar MCP server")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.config.log_format);

    let config = match ServerConfig::from_args(args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e);
        }
    };

    let secrets = ClientSecrets::load(&config.client_secret_path)?;
    let authenticator = Authenticator::new(secrets, TokenStore::new(&config.token_path))
        .with_callback_timeout(config.auth_timeout);
    let client = GoogleCalendarClient::with_base_url(Arc::new(authenticator), &config.api_base_url)?;

    tracing::info!(
        "gcal-mcp {} serving on stdio (API {})",
        gcal_mcp::VERSION,
        config.api_base_url
    );

    let server = McpServer::new(CalendarHandler::new(Arc::new(client)));
    server.run().await
}
