//! OAuth client secrets as downloaded from the Google Cloud console

use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{CalendarError, Result};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_CALLBACK_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientEntry>,
    web: Option<ClientEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

/// OAuth client registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl ClientSecrets {
    /// Load an `installed` or `web` client secrets file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Config(format!(
                "client secrets file not readable at {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| CalendarError::Config(format!("client secrets file is malformed: {e}")))?;
        let entry = file.installed.or(file.web).ok_or_else(|| {
            CalendarError::Config(
                "client secrets file has neither an 'installed' nor a 'web' section".to_string(),
            )
        })?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            redirect_uri: entry
                .redirect_uris
                .into_iter()
                .find(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            auth_uri: entry
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: entry
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }

    /// Port the local callback listener binds, taken from the redirect URI
    pub fn callback_port(&self) -> u16 {
        Url::parse(&self.redirect_uri)
            .ok()
            .and_then(|u| u.port())
            .unwrap_or(DEFAULT_CALLBACK_PORT)
    }

    /// Path the redirect lands on, `/callback` unless the URI says otherwise
    pub fn callback_path(&self) -> String {
        Url::parse(&self.redirect_uri)
            .ok()
            .map(|u| u.path().to_string())
            .filter(|p| p != "/")
            .unwrap_or_else(|| "/callback".to_string())
    }
}
