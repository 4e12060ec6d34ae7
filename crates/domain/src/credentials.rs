//! Session credentials with expiry tracking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the current session credentials.
///
/// `access_token` and `refresh_token` are either both present or both
/// absent; a partial state is only transiently allowed while a refresh is
/// in flight. `access_token_expires_at` is always set together with
/// `access_token`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived bearer token authorizing API calls.
    pub access_token: Option<String>,
    /// Longer-lived token used solely to obtain a new access token.
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Creates an empty (signed-out) snapshot.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            access_token_expires_at: None,
        }
    }

    /// Creates a fully-populated snapshot.
    #[must_use]
    pub fn authenticated(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            access_token_expires_at: Some(expires_at),
        }
    }

    /// Returns true if a refresh can be attempted.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns true if the access token expires within the given window.
    ///
    /// An already-expired token also reports true. Credentials without an
    /// expiry never report true.
    #[must_use]
    pub fn expires_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.access_token_expires_at
            .is_some_and(|expires_at| expires_at - now < window)
    }

    /// Returns true if both tokens are present or both are absent.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.access_token.is_some() == self.refresh_token.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_anonymous_credentials() {
        let creds = Credentials::anonymous();
        assert!(!creds.can_refresh());
        assert!(creds.is_complete());
        assert!(!creds.expires_within(Duration::minutes(5), Utc::now()));
    }

    #[test]
    fn test_authenticated_credentials() {
        let now = Utc::now();
        let creds = Credentials::authenticated("A1", "R1", now + Duration::hours(1));
        assert!(creds.can_refresh());
        assert!(creds.is_complete());
        assert_eq!(creds.access_token.as_deref(), Some("A1"));
    }

    #[test]
    fn test_expires_within_window() {
        let now = Utc::now();
        let creds = Credentials::authenticated("A1", "R1", now + Duration::seconds(60));

        // 60 seconds away is inside a 5-minute window.
        assert!(creds.expires_within(Duration::minutes(5), now));
        assert!(!creds.expires_within(Duration::seconds(30), now));
    }

    #[test]
    fn test_expired_token_reports_expiring() {
        let now = Utc::now();
        let creds = Credentials::authenticated("A1", "R1", now - Duration::seconds(10));
        assert!(creds.expires_within(Duration::minutes(5), now));
        assert!(creds.expires_within(Duration::zero(), now));
    }

    #[test]
    fn test_partial_state_is_incomplete() {
        let creds = Credentials {
            access_token: Some("A1".to_string()),
            refresh_token: None,
            access_token_expires_at: None,
        };
        assert!(!creds.is_complete());
    }

    #[test]
    fn test_serde_round_trip() {
        let now = Utc::now();
        let creds = Credentials::authenticated("A1", "R1", now + Duration::hours(1));
        let json = serde_json::to_string(&creds).unwrap();
        let back: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(creds, back);
    }
}
