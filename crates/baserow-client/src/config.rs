//! Client configuration and builder pattern.

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;

/// Public hosted Baserow service.
pub const DEFAULT_BASE_URL: &str = "https://baserow.io";

/// Rows requested per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Environment variable read by [`ClientConfigBuilder::from_env`].
pub const MAX_WRITE_RECORDS_ENV: &str = "BASEROW_MAX_WRITE_RECORDS_PRE_REQ";

const DEFAULT_MAX_WRITE_RECORDS: usize = 10;

/// Configuration for the Baserow client.
///
/// # Security
///
/// The `Debug` implementation masks the API key to prevent accidental exposure
/// in logs. The key is shown as `"***REDACTED***"` in debug output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Database token, sent as `Authorization: Token <api_key>`
    pub api_key: String,
    /// Base URL of the Baserow server (default: https://baserow.io)
    pub base_url: String,
    /// Request timeout (default: 30 seconds)
    pub timeout: Duration,
    /// Whether `select` may use the in-memory query cache (default: true)
    pub cache_enabled: bool,
    /// Whether to verify TLS certificates (default: true)
    pub tls_verify: bool,
    /// User-Agent header value
    pub user_agent: String,
    /// Write batch size. Not used by any operation yet.
    pub max_write_records_per_request: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            cache_enabled: true,
            tls_verify: true,
            user_agent: format!("baserow-client/{}", env!("CARGO_PKG_VERSION")),
            max_write_records_per_request: DEFAULT_MAX_WRITE_RECORDS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("cache_enabled", &self.cache_enabled)
            .field("tls_verify", &self.tls_verify)
            .field("user_agent", &self.user_agent)
            .field(
                "max_write_records_per_request",
                &self.max_write_records_per_request,
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::Config("api_key cannot be empty".to_string()));
        }

        if self.base_url.is_empty() {
            return Err(ClientError::Config("base_url cannot be empty".to_string()));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base_url: {}", e)))?;

        if self.timeout < Self::MIN_TIMEOUT {
            return Err(ClientError::Config(format!(
                "timeout ({:?}) must be >= {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }

        if self.max_write_records_per_request == 0 {
            return Err(ClientError::Config(
                "max_write_records_per_request must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL without trailing slashes.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Builder for client configuration.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                api_key: api_key.into(),
                ..Default::default()
            },
        }
    }

    /// Create a builder and apply overrides from the process environment.
    ///
    /// Reads `BASEROW_MAX_WRITE_RECORDS_PRE_REQ`; unset or unparsable values
    /// keep the default of 10.
    pub fn from_env(api_key: impl Into<String>) -> Self {
        let builder = Self::new(api_key);
        match std::env::var(MAX_WRITE_RECORDS_ENV) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => builder.max_write_records_per_request(n),
                Err(_) => {
                    tracing::warn!(
                        var = MAX_WRITE_RECORDS_ENV,
                        value = %raw,
                        "Ignoring unparsable environment override"
                    );
                    builder
                }
            },
            Err(_) => builder,
        }
    }

    /// Set the server base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Disable the query cache; `select` always goes to the server.
    pub fn no_cache(mut self) -> Self {
        self.config.cache_enabled = false;
        self
    }

    /// Set whether to verify TLS certificates.
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.config.tls_verify = verify;
        self
    }

    /// Set a custom User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the write batch size.
    pub fn max_write_records_per_request(mut self, n: usize) -> Self {
        self.config.max_write_records_per_request = n;
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
