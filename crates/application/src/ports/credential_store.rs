//! Credential store port

use chrono::{DateTime, Utc};
use stockline_domain::Credentials;

/// Port for the externally-owned session credentials.
///
/// Reads are non-blocking snapshots and may happen from any task. Writes
/// are only ever issued from within the refresh coordinator's critical
/// section or from an explicit logout, so implementations do not need their
/// own write coordination beyond plain interior mutability.
pub trait CredentialStore: Send + Sync {
    /// Returns the current credentials snapshot. Always returns immediately.
    fn get(&self) -> Credentials;

    /// Atomically replaces all three credential fields.
    fn set_tokens(&self, access_token: String, refresh_token: String, expires_at: DateTime<Utc>);

    /// Atomically resets all fields to absent and flips the authenticated
    /// flag to false.
    fn clear(&self);

    /// Returns true while a session is active.
    fn is_authenticated(&self) -> bool;
}
