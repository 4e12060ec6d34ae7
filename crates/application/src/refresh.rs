//! Refresh coordinator
//!
//! Collapses concurrent token-refresh triggers into a single network call.
//! The invariant the rest of the gateway relies on: at most one outstanding
//! `/auth/refresh` call at any instant.

use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use stockline_domain::{ApiRequest, GatewayError, GatewayResult};
use tokio::sync::Mutex;

use crate::config::GatewayConfig;
use crate::ports::{Clock, CredentialStore, HttpTransport};

/// Path of the token renewal endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Token renewal response payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    /// Access token lifetime in seconds.
    expires_in: i64,
    /// Only present when the auth server rotates refresh tokens.
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Serializes token refreshes.
///
/// Callers that find the access token stale invoke
/// [`ensure_fresh_token`](Self::ensure_fresh_token) and suspend on the
/// internal mutex. The first caller in performs the network call and settles
/// the credential store; everyone queued behind it re-reads the store after
/// acquisition and returns without a second call.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    config: Arc<GatewayConfig>,
    lock: Mutex<()>,
}

impl RefreshCoordinator {
    /// Creates a coordinator over the given ports.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            transport,
            store,
            clock,
            config,
            lock: Mutex::new(()),
        }
    }

    /// Ensures the stored access token is no longer `stale_access_token`.
    ///
    /// `stale_access_token` is the token the caller last observed (the one
    /// near expiry, or the one a 401 rejected). If the store already holds a
    /// different token when the critical section is entered, another caller
    /// finished the refresh first and no network call is made.
    ///
    /// On refresh failure the credentials are cleared before the error is
    /// returned, so queued waiters fail fast instead of re-attempting.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Refresh` if no refresh token is available or
    /// the refresh call fails.
    pub async fn ensure_fresh_token(&self, stale_access_token: Option<&str>) -> GatewayResult<()> {
        let _guard = self.lock.lock().await;

        let credentials = self.store.get();
        if let Some(current) = credentials.access_token.as_deref() {
            if Some(current) != stale_access_token {
                return Ok(());
            }
        }

        let Some(refresh_token) = credentials.refresh_token else {
            return Err(GatewayError::Refresh {
                message: "no refresh token available".to_string(),
            });
        };

        tracing::debug!("refreshing access token");
        match self.request_refresh(&refresh_token).await {
            Ok(renewed) => {
                let expires_at = self.clock.now() + Duration::seconds(renewed.expires_in);
                // The inventory API does not rotate refresh tokens; keep the
                // current one unless the response carries a replacement.
                let next_refresh = renewed.refresh_token.unwrap_or(refresh_token);
                self.store
                    .set_tokens(renewed.access_token, next_refresh, expires_at);
                tracing::debug!("access token refreshed");
                Ok(())
            }
            Err(error) => {
                self.store.clear();
                tracing::warn!(%error, "token refresh failed, session cleared");
                Err(error)
            }
        }
    }

    /// Performs the actual renewal call. Never attaches a bearer header.
    async fn request_refresh(&self, refresh_token: &str) -> GatewayResult<RefreshResponse> {
        let mut request =
            ApiRequest::post(REFRESH_PATH).with_body(json!({ "refreshToken": refresh_token }));
        request.set_header("Content-Type", "application/json");
        request.set_header(
            self.config.api_key_header.as_str(),
            self.config.api_key.as_str(),
        );

        let response =
            self.transport
                .execute(&request)
                .await
                .map_err(|e| GatewayError::Refresh {
                    message: e.to_string(),
                })?;

        if !response.is_success() {
            return Err(GatewayError::Refresh {
                message: format!("refresh rejected with HTTP {}", response.status),
            });
        }

        response
            .json::<RefreshResponse>()
            .map_err(|e| GatewayError::Refresh {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;
    use stockline_domain::{ApiResponse, Credentials};
    use url::Url;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        credentials: RwLock<Credentials>,
        authenticated: RwLock<bool>,
    }

    impl MemoryStore {
        fn seeded(credentials: Credentials) -> Self {
            Self {
                authenticated: RwLock::new(credentials.access_token.is_some()),
                credentials: RwLock::new(credentials),
            }
        }
    }

    impl CredentialStore for MemoryStore {
        fn get(&self) -> Credentials {
            self.credentials.read().expect("lock poisoned").clone()
        }

        fn set_tokens(
            &self,
            access_token: String,
            refresh_token: String,
            expires_at: DateTime<Utc>,
        ) {
            *self.credentials.write().expect("lock poisoned") =
                Credentials::authenticated(access_token, refresh_token, expires_at);
            *self.authenticated.write().expect("lock poisoned") = true;
        }

        fn clear(&self) {
            *self.credentials.write().expect("lock poisoned") = Credentials::anonymous();
            *self.authenticated.write().expect("lock poisoned") = false;
        }

        fn is_authenticated(&self) -> bool {
            *self.authenticated.read().expect("lock poisoned")
        }
    }

    struct ScriptedTransport {
        calls: AtomicUsize,
        response: GatewayResult<ApiResponse>,
    }

    impl ScriptedTransport {
        fn replying(response: GatewayResult<ApiResponse>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, _request: &ApiRequest) -> GatewayResult<ApiResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn coordinator(
        transport: Arc<ScriptedTransport>,
        store: Arc<MemoryStore>,
        now: DateTime<Utc>,
    ) -> RefreshCoordinator {
        let config = GatewayConfig::new(
            Url::parse("https://api.example.com").unwrap(),
            "test-api-key",
        );
        RefreshCoordinator::new(transport, store, Arc::new(FixedClock(now)), Arc::new(config))
    }

    fn refresh_ok(body: &str) -> GatewayResult<ApiResponse> {
        Ok(ApiResponse::new(200, HashMap::new(), body.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_no_refresh_token_fails_without_network_call() {
        let transport = Arc::new(ScriptedTransport::replying(refresh_ok("{}")));
        let store = Arc::new(MemoryStore::default());
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let coordinator = coordinator(Arc::clone(&transport), store, now);

        let result = coordinator.ensure_fresh_token(None).await;
        assert!(matches!(result, Err(GatewayError::Refresh { .. })));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_refresh_keeps_refresh_token() {
        let transport = Arc::new(ScriptedTransport::replying(refresh_ok(
            r#"{"accessToken":"A2","expiresIn":3600}"#,
        )));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A1",
            "R1",
            now + Duration::seconds(60),
        )));
        let coordinator = coordinator(Arc::clone(&transport), Arc::clone(&store), now);

        coordinator.ensure_fresh_token(Some("A1")).await.unwrap();

        let credentials = store.get();
        assert_eq!(credentials.access_token.as_deref(), Some("A2"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("R1"));
        assert_eq!(
            credentials.access_token_expires_at,
            Some(now + Duration::seconds(3600))
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_persisted() {
        let transport = Arc::new(ScriptedTransport::replying(refresh_ok(
            r#"{"accessToken":"A2","expiresIn":3600,"refreshToken":"R2"}"#,
        )));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A1",
            "R1",
            now + Duration::seconds(60),
        )));
        let coordinator = coordinator(transport, Arc::clone(&store), now);

        coordinator.ensure_fresh_token(Some("A1")).await.unwrap();
        assert_eq!(store.get().refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let transport = Arc::new(ScriptedTransport::replying(Ok(ApiResponse::new(
            400,
            HashMap::new(),
            b"{}".to_vec(),
        ))));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A1",
            "R1",
            now + Duration::seconds(60),
        )));
        let coordinator = coordinator(transport, Arc::clone(&store), now);

        let result = coordinator.ensure_fresh_token(Some("A1")).await;
        assert!(matches!(result, Err(GatewayError::Refresh { .. })));
        assert_eq!(store.get(), Credentials::anonymous());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_undecodable_refresh_payload_clears_session() {
        let transport = Arc::new(ScriptedTransport::replying(refresh_ok("not json")));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A1",
            "R1",
            now + Duration::seconds(60),
        )));
        let coordinator = coordinator(transport, Arc::clone(&store), now);

        let result = coordinator.ensure_fresh_token(Some("A1")).await;
        assert!(matches!(result, Err(GatewayError::Refresh { .. })));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_already_renewed_token_skips_network_call() {
        let transport = Arc::new(ScriptedTransport::replying(refresh_ok("{}")));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A2",
            "R1",
            now + Duration::seconds(3600),
        )));
        let coordinator = coordinator(Arc::clone(&transport), store, now);

        // Caller still holds A1; the store already moved on to A2.
        coordinator.ensure_fresh_token(Some("A1")).await.unwrap();
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_refresh_error() {
        let transport = Arc::new(ScriptedTransport::replying(Err(GatewayError::Network {
            message: "connection reset".to_string(),
        })));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::seeded(Credentials::authenticated(
            "A1",
            "R1",
            now + Duration::seconds(60),
        )));
        let coordinator = coordinator(transport, Arc::clone(&store), now);

        let result = coordinator.ensure_fresh_token(Some("A1")).await;
        let Err(GatewayError::Refresh { message }) = result else {
            panic!("expected refresh error");
        };
        assert!(message.contains("connection reset"));
        assert!(!store.is_authenticated());
    }
}
