//! Credential record persisted for the local user profile.
//!
//! The on-disk shape mirrors what the Claude CLI writes, so the file stays
//! interchangeable with records produced by the CLI itself:
//!
//! ```json
//! {
//!   "claudeAiOauth": {
//!     "accessToken": "...",
//!     "refreshToken": "...",
//!     "expiresAt": 1760000000,
//!     "scopes": ["user:inference", "user:profile"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Scopes granted to every credential record at creation.
pub const DEFAULT_SCOPES: &[&str] = &["user:inference", "user:profile"];

/// Proactive refresh buffer (5 minutes / 300 seconds).
const REFRESH_BUFFER_SECS: i64 = 300;

/// Top-level envelope of the credential file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct CredentialsFile {
    #[serde(rename = "claudeAiOauth")]
    pub claude_ai_oauth: OAuthCredentials,
}

/// OAuth credential record for the local user profile.
///
/// `expires_at` always reflects the token stored in `access_token`; the
/// refresh path replaces both token fields and the expiry together, never
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCredentials {
    /// Bearer token sent on API requests.
    pub access_token: String,

    /// Long-lived token exchanged for new access tokens.
    pub refresh_token: String,

    /// Unix timestamp (seconds) when `access_token` expires.
    pub expires_at: i64,

    /// Capability scopes granted to the token pair.
    pub scopes: Vec<String>,
}

impl OAuthCredentials {
    /// Create a record with the fixed default scopes.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check if the access token should be refreshed.
    ///
    /// Returns `true` when the token expires within the 300-second buffer,
    /// including tokens already past their expiry.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.expires_at - now <= REFRESH_BUFFER_SECS
    }

    /// Seconds until the access token expires, zero if already past.
    pub fn expires_in_secs(&self) -> u64 {
        let now = chrono::Utc::now().timestamp();
        let remaining = self.expires_at - now;
        if remaining > 0 { remaining as u64 } else { 0 }
    }
}
