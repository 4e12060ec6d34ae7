//! JSON-file credential store.
//!
//! Persists the session under the embedder's data directory so a restarted
//! client keeps its sign-in. The file should be excluded from backups that
//! leave the device.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockline_application::ports::CredentialStore;
use stockline_domain::Credentials;

const SCHEMA_VERSION: u32 = 1;

/// On-disk session format:
/// ```json
/// {
///   "schema_version": 1,
///   "access_token": "...",
///   "refresh_token": "...",
///   "access_token_expires_at": "2026-03-01T12:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    schema_version: u32,
    #[serde(flatten)]
    credentials: Credentials,
}

struct SessionState {
    credentials: Credentials,
    authenticated: bool,
}

/// Credential store backed by a JSON file.
///
/// The in-memory state is authoritative; every write is mirrored to disk via
/// a temp-file-then-rename swap so the file is never half-written. The
/// `CredentialStore` writers are infallible by contract, so a persistence
/// failure keeps the in-memory session and is logged instead of surfaced.
pub struct FileCredentialStore {
    path: PathBuf,
    state: RwLock<SessionState>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, restoring a persisted session if one
    /// exists. A missing or unreadable file yields a signed-out store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let credentials = Self::load(&path).unwrap_or_else(|| {
            tracing::debug!(path = %path.display(), "no persisted session, starting signed out");
            Credentials::anonymous()
        });
        Self {
            path,
            state: RwLock::new(SessionState {
                authenticated: credentials.access_token.is_some(),
                credentials,
            }),
        }
    }

    fn load(path: &Path) -> Option<Credentials> {
        let bytes = fs::read(path).ok()?;
        match serde_json::from_slice::<PersistedSession>(&bytes) {
            Ok(session) if session.schema_version == SCHEMA_VERSION => Some(session.credentials),
            Ok(session) => {
                tracing::warn!(
                    version = session.schema_version,
                    "unsupported session schema, discarding persisted session"
                );
                None
            }
            Err(error) => {
                tracing::warn!(%error, "could not parse persisted session, discarding");
                None
            }
        }
    }

    fn persist(&self, credentials: &Credentials) {
        if let Err(error) = self.try_persist(credentials) {
            tracing::warn!(%error, path = %self.path.display(), "failed to persist session");
        }
    }

    fn try_persist(&self, credentials: &Credentials) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let session = PersistedSession {
            schema_version: SCHEMA_VERSION,
            credentials: credentials.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&session).map_err(std::io::Error::other)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Credentials {
        self.read().credentials.clone()
    }

    fn set_tokens(&self, access_token: String, refresh_token: String, expires_at: DateTime<Utc>) {
        let mut state = self.write();
        state.credentials = Credentials::authenticated(access_token, refresh_token, expires_at);
        state.authenticated = true;
        self.persist(&state.credentials);
    }

    fn clear(&self) {
        let mut state = self.write();
        state.credentials = Credentials::anonymous();
        state.authenticated = false;
        self.persist(&state.credentials);
    }

    fn is_authenticated(&self) -> bool {
        self.read().authenticated
    }
}
