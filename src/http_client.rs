//! Shared HTTP client
//!
//! Features:
//! - HTTP/2 with fallback to HTTP/1.1
//! - Brotli, Gzip compression (auto-negotiated)
//! - Connection pooling with keep-alive
//! - Fixed per-request timeouts, no retries

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Browser user agent sent to providers that reject unknown clients.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timeout for provider search requests.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for every other request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client shared by handlers, scrapers and drive transports.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            // Don't assume HTTP/2 - let server negotiate
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Default timeout applied to requests built from this client.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`, failing on any non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<Response> {
        debug!("Fetching");
        let response = self.client.get(url).timeout(timeout).send().await?;
        ensure_success(url, response)
    }

    /// GET `url` and return the body as text.
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self.fetch(url, timeout).await?;
        Ok(response.text().await?)
    }

    /// Get the underlying reqwest client
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-2xx response into [`Error::Status`].
pub fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}
