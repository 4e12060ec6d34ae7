//! In-memory credential store.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use stockline_application::ports::CredentialStore;
use stockline_domain::Credentials;

struct SessionState {
    credentials: Credentials,
    authenticated: bool,
}

/// Process-local credential store.
///
/// Created once at startup and shared for the application lifetime; reset
/// only via `clear`. Reads hand out snapshots, so the lock is held only for
/// the duration of a clone.
pub struct MemoryCredentialStore {
    state: RwLock<SessionState>,
}

impl MemoryCredentialStore {
    /// Creates an empty (signed-out) store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                credentials: Credentials::anonymous(),
                authenticated: false,
            }),
        }
    }

    /// Creates a store pre-populated with an existing session.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            state: RwLock::new(SessionState {
                authenticated: credentials.access_token.is_some(),
                credentials,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        // A poisoned lock means a writer panicked mid-swap; the state itself
        // is still a coherent snapshot.
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Credentials {
        self.read().credentials.clone()
    }

    fn set_tokens(&self, access_token: String, refresh_token: String, expires_at: DateTime<Utc>) {
        let mut state = self.write();
        state.credentials = Credentials::authenticated(access_token, refresh_token, expires_at);
        state.authenticated = true;
    }

    fn clear(&self) {
        let mut state = self.write();
        state.credentials = Credentials::anonymous();
        state.authenticated = false;
    }

    fn is_authenticated(&self) -> bool {
        self.read().authenticated
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_starts_signed_out() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(), Credentials::anonymous());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_tokens_replaces_all_fields() {
        let store = MemoryCredentialStore::new();
        let expires_at = Utc::now() + Duration::hours(1);

        store.set_tokens("A1".to_string(), "R1".to_string(), expires_at);

        let credentials = store.get();
        assert_eq!(credentials.access_token.as_deref(), Some("A1"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("R1"));
        assert_eq!(credentials.access_token_expires_at, Some(expires_at));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = MemoryCredentialStore::new();
        store.set_tokens("A1".to_string(), "R1".to_string(), Utc::now());

        store.clear();

        assert_eq!(store.get(), Credentials::anonymous());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_with_credentials_restores_session() {
        let credentials = Credentials::authenticated("A1", "R1", Utc::now());
        let store = MemoryCredentialStore::with_credentials(credentials.clone());
        assert_eq!(store.get(), credentials);
        assert!(store.is_authenticated());
    }
}
