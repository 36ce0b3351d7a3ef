//! File-backed persistence for the credential record.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::credentials::{CredentialsFile, OAuthCredentials};
use crate::error::{AuthError, Result};

/// Directory under the user's home holding CLI state.
const CLAUDE_DIR: &str = ".claude";

/// Credential file name inside [`CLAUDE_DIR`].
const CREDENTIALS_FILE: &str = ".credentials.json";

/// File permissions (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Outcome of reading the credential file.
///
/// `Unreadable` covers both I/O failures on an existing file and parse
/// failures; the public contract folds it into "no credentials yet" so a
/// corrupt file behaves like a missing one.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    Loaded(OAuthCredentials),
    NotFound,
    Unreadable,
}

impl LoadOutcome {
    pub(crate) fn into_option(self) -> Option<OAuthCredentials> {
        match self {
            Self::Loaded(credentials) => Some(credentials),
            Self::NotFound | Self::Unreadable => None,
        }
    }
}

/// File-based credential store at `~/.claude/.credentials.json`.
///
/// The file is shared across process invocations with no locking; two
/// concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store at the fixed home-relative path.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: home.join(CLAUDE_DIR).join(CREDENTIALS_FILE),
        }
    }

    /// Create a store at a specific path (useful for testing).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record, if any.
    ///
    /// A missing file and an unreadable file look the same to callers:
    /// no credentials yet.
    pub fn load(&self) -> Option<OAuthCredentials> {
        self.read().into_option()
    }

    pub(crate) fn read(&self) -> LoadOutcome {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::NotFound,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                return LoadOutcome::Unreadable;
            }
        };

        match serde_json::from_str::<CredentialsFile>(&content) {
            Ok(file) => LoadOutcome::Loaded(file.claude_ai_oauth),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse credential file");
                LoadOutcome::Unreadable
            }
        }
    }

    /// Persist a record, fully overwriting any prior content.
    ///
    /// Creates the containing directory (including parents) if necessary.
    /// The write is a single overwrite; a crash mid-write may leave a
    /// corrupt file, which the next `load` treats as absent.
    pub fn save(&self, credentials: &OAuthCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!(
                    "failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = CredentialsFile {
            claude_ai_oauth: credentials.clone(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| AuthError::Storage(format!("failed to serialize credentials: {e}")))?;

        std::fs::write(&self.path, &content).map_err(|e| {
            AuthError::Storage(format!(
                "failed to write credential file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(FILE_MODE))
                .map_err(|e| {
                    AuthError::Storage(format!(
                        "failed to set permissions on '{}': {}",
                        self.path.display(),
                        e
                    ))
                })?;
        }

        debug!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    /// Delete the credential file. A missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!(
                "failed to remove credential file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
