//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It resolves request
//! paths against the configured base URL, sends exactly what the request
//! record describes, and performs no retries of its own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use stockline_application::ports::HttpTransport;
use stockline_application::GatewayConfig;
use stockline_domain::{ApiRequest, ApiResponse, GatewayError, GatewayResult, HttpMethod};
use url::Url;

/// HTTP transport backed by `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the given gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Network` if the underlying client cannot be
    /// constructed.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("Stockline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Converts the domain method to a reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Resolves the full endpoint URL for a request.
    ///
    /// The path is appended to the base URL so a base with a path prefix
    /// (e.g. `https://host/api/v1`) is preserved.
    fn endpoint(&self, request: &ApiRequest) -> GatewayResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| GatewayError::InvalidUrl(format!("{e}: {joined}")))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }

    /// Maps reqwest errors to `GatewayError::Network`.
    fn map_error(error: &reqwest::Error, timeout: Duration) -> GatewayError {
        let message = if error.is_timeout() {
            format!("request timed out after {} ms", timeout.as_millis())
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        GatewayError::Network { message }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        let url = self.endpoint(request)?;

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network {
                message: format!("failed to read body: {e}"),
            })?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }
}
