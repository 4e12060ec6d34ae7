//! Gateway error types

use thiserror::Error;

/// Errors surfaced to callers of the request gateway.
///
/// Every failure reaches the immediate caller; the only silent recovery the
/// gateway performs is the one-shot retry after a token refresh.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport-level failure, no response was received.
    #[error("network error: {message}")]
    Network {
        /// Error description from the transport.
        message: String,
    },

    /// The pre-send token refresh failed; credentials have been cleared.
    ///
    /// The caller is expected to redirect to a login flow.
    #[error("session expired, sign in again")]
    AuthExpired,

    /// The refresh call itself failed; credentials have been cleared.
    ///
    /// Surfaces to the original caller in place of the 401 that triggered it.
    #[error("token refresh failed: {message}")]
    Refresh {
        /// Error description.
        message: String,
    },

    /// A non-2xx, non-recoverable response.
    ///
    /// Covers any non-401 error status, and a 401 on a request that was
    /// already retried once. The body is preserved intact so callers can
    /// interpret it (e.g. field-level validation messages).
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body as text.
        body: String,
    },

    /// A request URL could not be constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A body or response payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Returns the HTTP status code if this is an `Http` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
