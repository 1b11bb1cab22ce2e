use std::time::Duration;

use reqwest::Client;
use reqwest::ClientBuilder;

use crate::errors::Result;

/// Configuration for HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host (default: 1)
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for connections (default: 90s)
    pub pool_idle_timeout: Duration,

    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,

    /// Total request timeout (default: none, the backend decides)
    pub request_timeout: Option<Duration>,

    /// TCP keepalive interval (default: 60s)
    pub tcp_keepalive: Duration,

    /// Enable TCP_NODELAY (default: true)
    pub tcp_nodelay: bool,

    /// Accept gzip/brotli encoded responses (default: true)
    pub compression: bool,

    /// Enable Hickory DNS for async resolution (default: true)
    pub hickory_dns: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 1,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            tcp_keepalive: Duration::from_secs(60),
            tcp_nodelay: true,
            compression: true,
            hickory_dns: true,
        }
    }
}

impl HttpClientConfig {
    /// Configuration for the one-shot index bootstrap: fail fast when the
    /// backend is down instead of stalling daemon startup.
    pub fn bootstrap() -> Self {
        Self { connect_timeout: Duration::from_secs(3), request_timeout: Some(Duration::from_secs(10)), ..Default::default() }
    }
}

/// Owned HTTP client.
///
/// Each instance keeps its own connection pool, so two owners never share a
/// socket. The type is deliberately not `Clone`.
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            // Connection pooling
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            // TCP optimization
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(Some(config.tcp_keepalive))
            .connect_timeout(config.connect_timeout)
            // TLS with rustls for https backends
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .gzip(config.compression)
            .brotli(config.compression);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        if config.hickory_dns {
            builder = builder.hickory_dns(true);
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request builder
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Create a PUT request builder
    pub fn put(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.put(url)
    }
}
