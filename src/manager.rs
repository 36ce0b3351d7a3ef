//! Token lifecycle manager and initial-setup path.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::credentials::OAuthCredentials;
use crate::error::{AuthError, Result};
use crate::store::CredentialStore;

/// Token-refresh endpoint.
const TOKEN_URL: &str = "https://console.anthropic.com/v1/oauth/token";

/// Success body from the token endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

/// Read-only authentication snapshot. Produced without any remote call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthStatus {
    /// Whether a credential record exists on disk.
    pub authenticated: bool,
    /// Whether the access token is within the proactive refresh window.
    pub needs_refresh: bool,
    /// Seconds until the access token expires (None if not authenticated).
    pub expires_in_secs: Option<u64>,
}

/// Manages the credential lifecycle: the expiry-check-and-refresh routine
/// plus the initial-setup path.
///
/// The credential file is re-read from disk on every operation; no token
/// state is cached in memory between calls. Not safe against concurrent
/// refreshes from separate processes; the last writer wins.
pub struct TokenManager {
    store: CredentialStore,
    http_client: reqwest::Client,
    token_url: String,
}

impl TokenManager {
    /// Create a manager over the default credential store.
    pub fn new() -> Self {
        Self::with_store(CredentialStore::new())
    }

    /// Create a manager over a specific store.
    pub fn with_store(store: CredentialStore) -> Self {
        Self {
            store,
            http_client: reqwest::Client::new(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Set the HTTP client (useful for custom TLS or timeout policy).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// Override the token endpoint (used by tests against a mock server).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// The store this manager persists through.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a valid access token, refreshing it first if it expires
    /// within the 300-second buffer.
    ///
    /// Performs at most one remote call per invocation. Fails terminally
    /// when no credential record exists ([`AuthError::NotAuthenticated`])
    /// or when the refresh exchange fails; there is no retry or backoff,
    /// so the caller must re-invoke.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let credentials = self.store.load().ok_or(AuthError::NotAuthenticated)?;

        if !credentials.needs_refresh() {
            debug!(
                expires_in_secs = credentials.expires_in_secs(),
                "Access token still valid"
            );
            return Ok(credentials.access_token);
        }

        debug!("Access token expiring, refreshing");
        let refreshed = self.refresh(&credentials).await?;
        self.store.save(&refreshed)?;
        info!(
            expires_in_secs = refreshed.expires_in_secs(),
            "Access token refreshed"
        );

        Ok(refreshed.access_token)
    }

    /// Exchange the current refresh token for a new token pair.
    ///
    /// Both token fields and the expiry are replaced together from the
    /// response; scopes carry over from the current record.
    async fn refresh(&self, current: &OAuthCredentials) -> Result<OAuthCredentials> {
        let request_body = serde_json::json!({
            "grant_type": "refresh_token",
            "refresh_token": current.refresh_token,
        });

        let response = self
            .http_client
            .post(&self.token_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Token refresh rejected");
            return Err(AuthError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RefreshResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::RefreshFailed {
                status: status.as_u16(),
                body: format!("unparseable token response: {e}"),
            })?;

        Ok(OAuthCredentials {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_at: chrono::Utc::now().timestamp() + parsed.expires_in,
            scopes: current.scopes.clone(),
        })
    }

    /// Write a fresh credential record from an external authorization flow.
    ///
    /// Unconditionally overwrites any prior record; scopes are fixed at
    /// creation. `expires_at` is taken as an absolute Unix timestamp in its
    /// external string form; no plausibility validation is performed, and a
    /// malformed value coerces to zero, which reads as already expired on
    /// the next check.
    pub fn setup_oauth_credentials(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_at: &str,
    ) -> Result<()> {
        let expires_at = match expires_at.parse::<i64>() {
            Ok(timestamp) => timestamp,
            Err(_) => {
                warn!(value = expires_at, "Unparseable expiry timestamp, storing as expired");
                0
            }
        };

        let credentials = OAuthCredentials::new(access_token, refresh_token, expires_at);
        self.store.save(&credentials)?;
        info!(path = %self.store.path().display(), "OAuth credentials stored");

        Ok(())
    }

    /// Report the current authentication state without any remote call.
    pub fn status(&self) -> AuthStatus {
        match self.store.load() {
            Some(credentials) => AuthStatus {
                authenticated: true,
                needs_refresh: credentials.needs_refresh(),
                expires_in_secs: Some(credentials.expires_in_secs()),
            },
            None => AuthStatus {
                authenticated: false,
                needs_refresh: false,
                expires_in_secs: None,
            },
        }
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager(dir: &tempfile::TempDir) -> TokenManager {
        TokenManager::with_store(CredentialStore::with_path(
            dir.path().join(".credentials.json"),
        ))
    }

    #[test]
    fn test_setup_writes_record_with_fixed_scopes() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        manager
            .setup_oauth_credentials("access", "refresh", "1760000000")
            .unwrap();

        let stored = manager.store().load().unwrap();
        assert_eq!(stored.access_token, "access");
        assert_eq!(stored.refresh_token, "refresh");
        assert_eq!(stored.expires_at, 1760000000);
        assert_eq!(stored.scopes, vec!["user:inference", "user:profile"]);
    }

    #[test]
    fn test_setup_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        manager
            .setup_oauth_credentials("access1", "refresh1", "100")
            .unwrap();
        manager
            .setup_oauth_credentials("access2", "refresh2", "200")
            .unwrap();

        let stored = manager.store().load().unwrap();
        assert_eq!(stored.access_token, "access2");
        assert_eq!(stored.refresh_token, "refresh2");
        assert_eq!(stored.expires_at, 200);
        // Scopes stay the fixed set, no accumulation across setups.
        assert_eq!(stored.scopes.len(), 2);
    }

    #[test]
    fn test_setup_malformed_expiry_reads_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        manager
            .setup_oauth_credentials("access", "refresh", "not-a-number")
            .unwrap();

        let stored = manager.store().load().unwrap();
        assert_eq!(stored.expires_at, 0);
        assert!(stored.needs_refresh());
    }

    #[test]
    fn test_status_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        let status = manager.status();
        assert!(!status.authenticated);
        assert!(!status.needs_refresh);
        assert!(status.expires_in_secs.is_none());
    }

    #[test]
    fn test_status_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        let expires_at = (chrono::Utc::now().timestamp() + 3600).to_string();
        manager
            .setup_oauth_credentials("access", "refresh", &expires_at)
            .unwrap();

        let status = manager.status();
        assert!(status.authenticated);
        assert!(!status.needs_refresh);
        assert!(status.expires_in_secs.unwrap() > 3000);
    }

    #[tokio::test]
    async fn test_ensure_valid_token_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let manager = test_manager(&dir);

        let err = manager.ensure_valid_token().await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }
}
