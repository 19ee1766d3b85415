// crates/network/src/client.rs
//! HTTP client wrapper with resilience

use crate::error::{NetworkError, NetworkResult};
use bytes::Bytes;
use dreamfm_resilience::{with_retry, RetryPolicy, Timeout};
use reqwest::Client as ReqwestClient;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Limit for a whole request, body included
    pub timeout: Duration,
    /// Limit for establishing the connection
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Retry policy; a single attempt unless configured otherwise
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("DreamFM/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
            retry_policy: RetryPolicy::no_retry(),
        }
    }
}

/// HTTP client with timeout and retry handling
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a GET request and returns the full response body
    ///
    /// Any non-success status is an error. Each attempt is bounded by the
    /// configured timeout; retries follow the configured policy and never
    /// repeat client errors.
    pub async fn get_bytes(&self, url: &str) -> NetworkResult<Bytes> {
        let timeout = Timeout::new(self.config.timeout);

        with_retry(&self.config.retry_policy, NetworkError::is_retryable, || {
            let timeout = timeout.clone();
            async move {
                match timeout.run(self.fetch_once(url)).await {
                    Ok(result) => result,
                    Err(elapsed) => Err(NetworkError::from(elapsed)),
                }
            }
        })
        .await
    }

    /// Single GET attempt
    async fn fetch_once(&self, url: &str) -> NetworkResult<Bytes> {
        let response = self.inner.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish()
    }
}
