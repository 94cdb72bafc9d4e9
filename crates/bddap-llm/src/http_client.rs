//! Shared HTTP client for the OpenAI-compatible backends
//!
//! One `reqwest::Client` per backend, connection reuse, a global timeout cap.
//! Requests are sent exactly once: retries and rate limiting are left to the
//! caller.

use bddap_utils::redaction::redact_secrets;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::LlmError;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns a description of the failure if the client cannot be built
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
        })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send `request_builder` once with `min(request_timeout, max_timeout)`.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx
    /// - `LlmError::Timeout` for timeouts
    /// - `LlmError::Transport` for everything else
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Option<Duration>,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout
            .map_or(self.max_timeout, |t| t.min(self.max_timeout));

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    duration: effective_timeout,
                }
            } else {
                LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_secrets(&e.to_string())
                ))
            }
        })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(map_client_error(status, provider_name));
        }
        if status.is_server_error() {
            return Err(LlmError::ProviderOutage(format!(
                "{provider_name} returned server error: {status}"
            )));
        }

        Ok(response)
    }
}

/// Map HTTP client error status codes to `LlmError` variants
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}
