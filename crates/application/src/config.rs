//! Gateway configuration

use url::Url;

/// Default header carrying the static API key.
pub const DEFAULT_API_KEY_HEADER: &str = "X-Api-Key";

/// Default transport timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the request gateway.
///
/// Constructed once by the embedding application and shared between the
/// gateway and its transport adapter.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the remote inventory API.
    pub base_url: Url,
    /// Header name for the static API key.
    pub api_key_header: String,
    /// Static API key attached to every request.
    pub api_key: String,
    /// Transport timeout applied uniformly to every request.
    pub timeout_ms: u64,
}

impl GatewayConfig {
    /// Creates a configuration with default header name and timeout.
    #[must_use]
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            api_key: api_key.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Overrides the API key header name.
    #[must_use]
    pub fn with_api_key_header(mut self, name: impl Into<String>) -> Self {
        self.api_key_header = name.into();
        self
    }

    /// Overrides the transport timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new(Url::parse("https://api.example.com").unwrap(), "key-1");
        assert_eq!(config.api_key_header, "X-Api-Key");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.api_key, "key-1");
    }

    #[test]
    fn test_builder_overrides() {
        let config = GatewayConfig::new(Url::parse("https://api.example.com").unwrap(), "key-1")
            .with_api_key_header("X-Inventory-Key")
            .with_timeout_ms(5_000);
        assert_eq!(config.api_key_header, "X-Inventory-Key");
        assert_eq!(config.timeout_ms, 5_000);
    }
}
