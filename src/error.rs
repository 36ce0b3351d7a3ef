//! Error taxonomy for credential storage and token refresh.

/// Errors from credential storage and token lifecycle operations.
///
/// All variants are terminal for the current invocation; there is no
/// internal retry or recovery. Callers either re-invoke or redo setup.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential record exists; the setup path has not run yet.
    #[error("not authenticated: no stored credentials")]
    NotAuthenticated,

    /// The token endpoint answered with a non-success status.
    #[error("token refresh failed (HTTP {status}): {body}")]
    RefreshFailed {
        /// HTTP status code returned by the token endpoint.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Transport-level failure talking to the token endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure persisting the credential record.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AuthError>;
