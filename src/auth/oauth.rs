//! OAuth2 authorization-code flow against Google's endpoints

use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;

use super::credentials::ClientSecrets;
use super::tokens::StoredToken;
use crate::error::{CalendarError, RemoteOperation, Result};

/// Scope requested for calendar access
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, now_ms: i64, previous_refresh: Option<&str>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry_date: self.expires_in.map(|secs| now_ms + secs * 1000),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scope: self.scope.unwrap_or_else(|| CALENDAR_SCOPE.to_string()),
        }
    }
}

/// OAuth client for one registered application
pub struct OAuthClient {
    http: reqwest::Client,
    secrets: ClientSecrets,
}

impl OAuthClient {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self {
            http: reqwest::Client::new(),
            secrets,
        }
    }

    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    /// Consent URL requesting offline access to the calendar scope
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", self.secrets.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| CalendarError::Config(format!("invalid auth_uri: {e}")))
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken> {
        let form = [
            ("code", code),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("redirect_uri", self.secrets.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .token_request(RemoteOperation::TokenExchange, &form)
            .await?;
        Ok(response.into_stored(Utc::now().timestamp_millis(), None))
    }

    /// Obtain a fresh access token; the refresh token is kept when Google
    /// does not rotate it
    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let form = [
            ("refresh_token", refresh_token),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .token_request(RemoteOperation::TokenRefresh, &form)
            .await?;
        Ok(response.into_stored(Utc::now().timestamp_millis(), Some(refresh_token)))
    }

    async fn token_request(
        &self,
        operation: RemoteOperation,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| CalendarError::remote(operation, None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CalendarError::remote(operation, Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(CalendarError::remote(operation, Some(status.as_u16()), message));
        }

        serde_json::from_str(&body).map_err(|e| {
            CalendarError::remote(operation, Some(status.as_u16()), format!("malformed token response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI};

    fn client() -> OAuthClient {
        OAuthClient::new(ClientSecrets {
            client_id: "id.apps".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        })
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = client().authorization_url("xyz").unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "id.apps");
        assert_eq!(params["redirect_uri"], "http://localhost:8080/callback");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["scope"], CALENDAR_SCOPE);
        assert_eq!(params["state"], "xyz");
    }

    #[test]
    fn test_refresh_response_keeps_previous_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","expires_in":3599,"token_type":"Bearer"}"#)
                .unwrap();
        let token = response.into_stored(1_000, Some("old-refresh"));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(token.expiry_date, Some(1_000 + 3_599_000));
        assert_eq!(token.scope, CALENDAR_SCOPE);
    }

    #[test]
    fn test_rotated_refresh_token_wins() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"rotated","expires_in":10}"#,
        )
        .unwrap();
        let token = response.into_stored(0, Some("old"));
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
    }
}
