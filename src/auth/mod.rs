//! Google OAuth2 authentication
//!
//! Provides:
//! - Client secrets loading (`installed` / `web` files)
//! - Token persistence in the googleapis token-file format
//! - Refresh on expiry, falling back to the interactive consent flow
//! - A local callback listener for the consent redirect

mod callback;
mod credentials;
mod oauth;
mod tokens;

pub use callback::{open_browser, CallbackListener};
pub use credentials::{ClientSecrets, DEFAULT_AUTH_URI, DEFAULT_REDIRECT_URI, DEFAULT_TOKEN_URI};
pub use oauth::{OAuthClient, CALENDAR_SCOPE};
pub use tokens::{StoredToken, TokenStore};

use std::time::Duration;

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;

use crate::error::Result;

/// Default wait for the user to finish the consent flow
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(300);

/// Supplies bearer tokens for API requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for tests and pre-issued credentials
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Lazily authenticated credentials backed by a token file.
///
/// Nothing touches the network or disk until the first token is needed.
pub struct Authenticator {
    oauth: OAuthClient,
    store: TokenStore,
    callback_timeout: Duration,
    current: Mutex<Option<StoredToken>>,
}

impl Authenticator {
    pub fn new(secrets: ClientSecrets, store: TokenStore) -> Self {
        Self {
            oauth: OAuthClient::new(secrets),
            store,
            callback_timeout: DEFAULT_AUTH_TIMEOUT,
            current: Mutex::new(None),
        }
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return a valid token, refreshing or re-authorizing as required
    pub async fn ensure_authenticated(&self) -> Result<StoredToken> {
        let mut current = self.current.lock().await;

        if current.is_none() {
            *current = self.store.load();
        }

        if let Some(token) = current.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let refresh_token = current.as_ref().and_then(|t| t.refresh_token.clone());
        if let Some(refresh_token) = refresh_token {
            match self.oauth.refresh(&refresh_token).await {
                Ok(token) => {
                    tracing::info!("refreshed Google access token");
                    self.store.save(&token)?;
                    *current = Some(token.clone());
                    return Ok(token);
                }
                Err(e) => {
                    tracing::warn!("token refresh failed, starting interactive authorization: {}", e);
                }
            }
        }

        let token = self.authorize_interactively().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    /// Run the consent flow, persist the result and return it
    pub async fn authorize_interactively(&self) -> Result<StoredToken> {
        let secrets = self.oauth.secrets();
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let listener =
            CallbackListener::bind(secrets.callback_port(), &secrets.callback_path(), state.clone())
                .await?;
        let url = self.oauth.authorization_url(&state)?;

        eprintln!("Authorize this application by visiting:\n\n  {url}\n");
        open_browser(url.as_str());
        tracing::info!(
            "waiting up to {}s for the OAuth callback on {}",
            self.callback_timeout.as_secs(),
            listener.local_addr()?
        );

        let code = listener.wait_for_code(self.callback_timeout).await?;
        let token = self.oauth.exchange_code(&code).await?;
        self.store.save(&token)?;
        tracing::info!("stored new token at {}", self.store.path().display());
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for Authenticator {
    async fn access_token(&self) -> Result<String> {
        Ok(self.ensure_authenticated().await?.access_token)
    }
}
