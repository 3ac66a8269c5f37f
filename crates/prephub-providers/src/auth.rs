//! Signed-in user state.
//!
//! Credentials are persisted as JSON and read once into an [`AuthContext`],
//! which is then passed explicitly to whatever needs the bearer token.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of the signed-in user, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// A bearer token together with the user it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: UserIdentity,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("user", &self.user)
            .finish()
    }
}

/// On-disk shape. Either half may be missing in a damaged file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserIdentity>,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to access credentials at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credentials: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON file holding the current credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored credentials. `Ok(None)` unless both token and user are present.
    pub fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let stored: StoredCredentials = serde_json::from_str(&content)?;
        Ok(match (stored.token, stored.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Credentials { token, user }),
            _ => None,
        })
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let io_err = |source: std::io::Error| CredentialError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let stored = StoredCredentials {
            token: Some(credentials.token.clone()),
            user: Some(credentials.user.clone()),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, json).map_err(io_err)
    }

    /// Remove stored credentials. Missing files are not an error.
    pub fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Who is signed in, if anyone.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
    user: Option<UserIdentity>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user", &self.user)
            .finish()
    }
}

impl AuthContext {
    /// No token, no user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A bare token (e.g. from `PREPHUB_TOKEN`) with no known user.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            user: None,
        }
    }

    /// Restore state from the store. Anything short of a complete token and
    /// user pair yields an anonymous context.
    pub fn init(store: &CredentialStore) -> Self {
        match store.load() {
            Ok(Some(credentials)) => {
                tracing::debug!(user = %credentials.user.email, "restored credentials");
                Self {
                    token: Some(credentials.token),
                    user: Some(credentials.user),
                }
            }
            Ok(None) => Self::anonymous(),
            Err(e) => {
                tracing::warn!("ignoring stored credentials: {e}");
                Self::anonymous()
            }
        }
    }

    /// Persist `credentials` and adopt them.
    pub fn sign_in(
        &mut self,
        store: &CredentialStore,
        credentials: Credentials,
    ) -> Result<(), CredentialError> {
        store.save(&credentials)?;
        self.token = Some(credentials.token);
        self.user = Some(credentials.user);
        Ok(())
    }

    /// Forget the signed-in user, in memory and on disk.
    pub fn teardown(&mut self, store: &CredentialStore) -> Result<(), CredentialError> {
        self.token = None;
        self.user = None;
        store.clear()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
