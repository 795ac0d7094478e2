//! Local redirect listener for the interactive consent flow

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::error::{CalendarError, Result};

const SUCCESS_PAGE: &str = "<html><body><h1>Authentication successful</h1>\
<p>You can close this window and return to your MCP client.</p></body></html>";

type CodeSender = oneshot::Sender<Result<String>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<String>,
    sender: Arc<Mutex<Option<CodeSender>>>,
}

/// One-shot HTTP listener that waits for Google's redirect
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
    expected_state: String,
}

impl CallbackListener {
    /// Bind on loopback; port 0 picks a free port
    pub async fn bind(port: u16, path: &str, expected_state: impl Into<String>) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            CalendarError::Auth(format!("cannot listen for the OAuth callback on {addr}: {e}"))
        })?;
        Ok(Self {
            listener,
            path: path.to_string(),
            expected_state: expected_state.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the first callback arrives or `timeout` elapses.
    /// The listener is shut down on every outcome.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String> {
        let Self {
            listener,
            path,
            expected_state,
        } = self;
        let (code_tx, code_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = CallbackState {
            expected_state: Arc::new(expected_state),
            sender: Arc::new(Mutex::new(Some(code_tx))),
        };
        let app = Router::new()
            .route(&path, get(callback_handler))
            .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
            .with_state(state);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = match tokio::time::timeout(timeout, code_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CalendarError::Auth(
                "OAuth callback listener stopped unexpectedly".to_string(),
            )),
            Err(_) => Err(CalendarError::Auth(format!(
                "timed out after {}s waiting for the OAuth callback",
                timeout.as_secs()
            ))),
        };

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("OAuth callback listener error: {}", e),
            Err(e) => tracing::warn!("OAuth callback listener task failed: {}", e),
        }

        outcome
    }
}

async fn callback_handler(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let outcome = check_callback(&params, &state.expected_state);

    // Failure text echoes query parameters, so it is never served as HTML
    let response = match &outcome {
        Ok(_) => Html(SUCCESS_PAGE).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            format!("Authentication failed: {e}\n"),
        )
            .into_response(),
    };

    if let Some(tx) = state.sender.lock().take() {
        let _ = tx.send(outcome);
    }
    response
}

fn check_callback(params: &HashMap<String, String>, expected_state: &str) -> Result<String> {
    if let Some(error) = params.get("error") {
        return Err(CalendarError::Auth(format!("authorization was denied: {error}")));
    }
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(CalendarError::Auth(
            "OAuth state parameter did not match".to_string(),
        ));
    }
    match params.get("code") {
        Some(code) if !code.is_empty() => Ok(code.clone()),
        _ => Err(CalendarError::Auth(
            "no authorization code in callback".to_string(),
        )),
    }
}

/// Best-effort attempt to open the consent page in a browser
pub fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let result = std::process::Command::new("xdg-open").arg(url).spawn();

    if let Err(e) = result {
        tracing::debug!("could not open a browser: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_check_callback() {
        assert_eq!(
            check_callback(&params(&[("code", "4/abc"), ("state", "s1")]), "s1").unwrap(),
            "4/abc"
        );
        assert!(check_callback(&params(&[("code", "4/abc"), ("state", "other")]), "s1").is_err());
        assert!(check_callback(&params(&[("state", "s1")]), "s1").is_err());
        let err = check_callback(&params(&[("error", "access_denied"), ("state", "s1")]), "s1")
            .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn test_listener_delivers_code() {
        let listener = CallbackListener::bind(0, "/callback", "st").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(10)));

        let missing = reqwest::get(format!("http://{addr}/elsewhere")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let ok = reqwest::get(format!("http://{addr}/callback?code=4%2Fxyz&state=st"))
            .await
            .unwrap();
        assert_eq!(ok.status(), reqwest::StatusCode::OK);

        assert_eq!(waiter.await.unwrap().unwrap(), "4/xyz");
    }

    #[tokio::test]
    async fn test_listener_rejects_denied_consent() {
        let listener = CallbackListener::bind(0, "/callback", "st").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(10)));

        let resp = reqwest::get(format!("http://{addr}/callback?error=access_denied&state=st"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, CalendarError::Auth(_)));
    }

    #[tokio::test]
    async fn test_failure_page_is_plain_text() {
        let listener = CallbackListener::bind(0, "/callback", "st").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let waiter = tokio::spawn(listener.wait_for_code(Duration::from_secs(10)));

        let resp = reqwest::get(format!(
            "http://{addr}/callback?error=%3Cscript%3Ealert(1)%3C%2Fscript%3E&state=st"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"), "{content_type}");
        assert!(resp.text().await.unwrap().contains("<script>alert(1)</script>"));

        assert!(waiter.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_listener_times_out() {
        let listener = CallbackListener::bind(0, "/callback", "st").await.unwrap();
        let err = listener
            .wait_for_code(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
