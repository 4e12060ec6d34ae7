//! HTTP transport port

use async_trait::async_trait;
use stockline_domain::{ApiRequest, ApiResponse, GatewayResult};

/// Port for sending HTTP requests to the remote inventory API.
///
/// Implementations resolve the request path against their configured base
/// URL, send exactly what the record describes, and return the response
/// regardless of status code. Transport-level failures (no response
/// received) surface as `GatewayError::Network`; the transport performs no
/// retries of its own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes a single HTTP request.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Network` on connection, timeout or protocol
    /// failures, and `GatewayError::InvalidUrl` if the path cannot be
    /// resolved against the base URL.
    async fn execute(&self, request: &ApiRequest) -> GatewayResult<ApiResponse>;
}
