//! # claude-oauth
//!
//! Credential store and token lifecycle for Claude CLI OAuth profiles.
//!
//! Persists an access/refresh token pair at `~/.claude/.credentials.json`,
//! renews the access token when it is within 300 seconds of expiry, and
//! provides the initial-setup path that writes credentials obtained from an
//! external authorization flow.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use claude_oauth::TokenManager;
//!
//! # async fn example() -> claude_oauth::Result<()> {
//! let manager = TokenManager::new();
//!
//! // One-time setup with tokens from the external authorization flow.
//! manager.setup_oauth_credentials("sk-ant-oat...", "sk-ant-ort...", "1760000000")?;
//!
//! // Before each API call: returns a valid bearer token, refreshing and
//! // re-persisting the credential file if it is about to expire.
//! let token = manager.ensure_valid_token().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The interactive authorization flow that first obtains the tokens is out
//! of scope; so are multi-profile storage, cross-process file locking, and
//! encryption at rest.

#![warn(missing_docs)]

pub mod credentials;
pub mod error;
pub mod manager;
pub mod store;

pub use credentials::{DEFAULT_SCOPES, OAuthCredentials};
pub use error::{AuthError, Result};
pub use manager::{AuthStatus, TokenManager};
pub use store::CredentialStore;
