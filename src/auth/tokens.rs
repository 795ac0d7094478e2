//! OAuth token persistence
//!
//! The file layout matches what the googleapis client libraries write, so an
//! existing token file can be reused.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tokens are treated as expired this long before their actual expiry
const EXPIRY_SKEW_MS: i64 = 60_000;

/// Persisted OAuth token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// A token without a known expiry counts as expired
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expiry_date {
            Some(expiry) => expiry <= now_ms + EXPIRY_SKEW_MS,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }
}

/// Token file on disk
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token; a missing or unreadable file yields `None`
    pub fn load(&self) -> Option<StoredToken> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("no token at {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!("ignoring malformed token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write the token, creating parent directories as needed
    pub fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!("saved token to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn token(expiry: Option<i64>) -> StoredToken {
        StoredToken {
            access_token: "ya29.a0".to_string(),
            refresh_token: Some("1//0g".to_string()),
            expiry_date: expiry,
            token_type: "Bearer".to_string(),
            scope: "https://www.googleapis.com/auth/calendar".to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        assert!(store.load().is_none());

        let t = token(Some(1_700_000_000_000));
        store.save(&t).unwrap();
        assert_eq!(store.load(), Some(t));
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(TokenStore::new(path).load().is_none());
    }

    #[test]
    fn test_reads_googleapis_token_file() {
        let parsed: StoredToken = serde_json::from_str(
            r#"{"access_token":"a","scope":"s","token_type":"Bearer","expiry_date":1700000000000,"refresh_token_expires_in":604799}"#,
        )
        .unwrap();
        assert_eq!(parsed.expiry_date, Some(1_700_000_000_000));
        assert_eq!(parsed.refresh_token, None);
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = 1_000_000;
        assert!(token(None).is_expired_at(now));
        assert!(token(Some(now + 30_000)).is_expired_at(now));
        assert!(!token(Some(now + 120_000)).is_expired_at(now));
    }
}
