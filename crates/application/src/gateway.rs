//! Authenticated request gateway
//!
//! Wraps the HTTP transport with a pre-send freshness check and a
//! post-response 401 recovery cycle. Callers use the verb API and never
//! manage tokens directly.

use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stockline_domain::{ApiRequest, ApiResponse, GatewayError, GatewayResult};

use crate::config::GatewayConfig;
use crate::ports::{Clock, CredentialStore, HttpTransport};
use crate::refresh::RefreshCoordinator;

/// Remaining lifetime under which the access token is renewed before a
/// request is sent.
pub const REFRESH_THRESHOLD_SECS: i64 = 5 * 60;

/// The authenticated request gateway.
///
/// Request lifecycle: the pre-send interceptor renews a near-expiry token
/// (awaiting the shared [`RefreshCoordinator`]), attaches headers, and the
/// request goes out. A 401 response triggers one recovery cycle: refresh,
/// re-attach the new token, resend the identical request once. Any further
/// 401 is terminal.
pub struct ApiGateway {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    refresh: RefreshCoordinator,
}

impl ApiGateway {
    /// Creates a gateway over the given ports.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let refresh = RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&config),
        );
        Self {
            config,
            transport,
            store,
            clock,
            refresh,
        }
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, path: &str) -> GatewayResult<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    /// Sends a GET request and decodes the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send); additionally returns
    /// `GatewayError::Serialization` if the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// Sends a POST request with a JSON payload.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> GatewayResult<ApiResponse> {
        self.send(ApiRequest::post(path).with_json(payload)?).await
    }

    /// Sends a PUT request with a JSON payload.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn put<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> GatewayResult<ApiResponse> {
        self.send(ApiRequest::put(path).with_json(payload)?).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> GatewayResult<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Sends a prepared request through the full interceptor pipeline.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Network` — transport failure, no retry.
    /// - `GatewayError::AuthExpired` — pre-send refresh failed.
    /// - `GatewayError::Refresh` — post-401 refresh failed.
    /// - `GatewayError::Http` — non-2xx outcome, body preserved.
    pub async fn send(&self, mut request: ApiRequest) -> GatewayResult<ApiResponse> {
        self.before_send(&mut request).await?;
        let response = self.transport.execute(&request).await?;
        self.after_receive(request, response).await
    }

    /// Seeds the credential store after an external sign-in flow.
    pub fn set_session(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: i64,
    ) {
        let expires_at = self.clock.now() + Duration::seconds(expires_in_secs);
        self.store
            .set_tokens(access_token.into(), refresh_token.into(), expires_at);
    }

    /// Clears the session. The only credential writer besides the
    /// refresh coordinator.
    pub fn logout(&self) {
        self.store.clear();
    }

    /// Returns true while a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Pre-send interceptor: renew a near-expiry token, then decorate.
    ///
    /// A request without any access token goes out unauthenticated; the
    /// remote API is expected to reject it, which is not a client-side
    /// error.
    async fn before_send(&self, request: &mut ApiRequest) -> GatewayResult<()> {
        let credentials = self.store.get();
        if credentials.can_refresh()
            && credentials.expires_within(
                Duration::seconds(REFRESH_THRESHOLD_SECS),
                self.clock.now(),
            )
        {
            if let Err(error) = self
                .refresh
                .ensure_fresh_token(credentials.access_token.as_deref())
                .await
            {
                tracing::warn!(%error, path = %request.path, "pre-send token refresh failed");
                return Err(GatewayError::AuthExpired);
            }
        }

        request.set_header("Content-Type", "application/json");
        request.set_header(
            self.config.api_key_header.as_str(),
            self.config.api_key.as_str(),
        );
        // Re-read: the refresh above may have replaced the token.
        if let Some(token) = self.store.get().access_token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        Ok(())
    }

    /// Post-response interceptor: one recovery cycle per request.
    async fn after_receive(
        &self,
        mut request: ApiRequest,
        response: ApiResponse,
    ) -> GatewayResult<ApiResponse> {
        if !response.is_unauthorized() {
            return Self::into_outcome(response);
        }
        if request.was_retried() {
            return Err(Self::http_error(&response));
        }
        request.mark_retried();

        if !self.store.get().can_refresh() {
            self.store.clear();
            return Err(Self::http_error(&response));
        }

        let stale = request.bearer_token().map(str::to_owned);
        self.refresh.ensure_fresh_token(stale.as_deref()).await?;

        if let Some(token) = self.store.get().access_token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        tracing::debug!(path = %request.path, "replaying request after token refresh");
        let retry = self.transport.execute(&request).await?;
        // Marker is already set; a second 401 is terminal.
        Self::into_outcome(retry)
    }

    fn into_outcome(response: ApiResponse) -> GatewayResult<ApiResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(Self::http_error(&response))
        }
    }

    fn http_error(response: &ApiResponse) -> GatewayError {
        GatewayError::Http {
            status: response.status,
            body: response.body_text(),
        }
    }
}
