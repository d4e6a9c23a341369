//! Configuration for the Slack directory client.
//!
//! Supports loading configuration from:
//! - Environment variables (a `.env` file is loaded by the binary first)
//! - Explicit values through the builder methods

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::{SlackError, SlackResult};

/// Slack Web API root.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Items requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Upper bound for a whole HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_ACCESS_TOKEN: &str = "SLACK_ACCESS_TOKEN";
const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
const ENV_API_BASE: &str = "SLACK_API_BASE";
const ENV_PAGE_SIZE: &str = "SLACK_PAGE_SIZE";
const ENV_TIMEOUT_SECS: &str = "SLACK_TIMEOUT_SECS";

/// Configuration for the Slack directory client.
#[derive(Clone)]
pub struct SlackConfig {
    /// OAuth access token (xoxb-... or xoxp-...).
    access_token: SecretString,
    /// API root, without trailing slash.
    api_base: String,
    /// `limit` sent with listing calls.
    page_size: u32,
    request_timeout: Duration,
    connect_timeout: Duration,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("access_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl SlackConfig {
    /// Create a configuration with default endpoint and limits.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into().into()),
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Point the client at another API root (used by tests and proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SLACK_ACCESS_TOKEN` (or `SLACK_BOT_TOKEN`)
    ///
    /// Optional variables:
    /// - `SLACK_API_BASE`
    /// - `SLACK_PAGE_SIZE`
    /// - `SLACK_TIMEOUT_SECS`
    pub fn from_env() -> SlackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> SlackResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup(ENV_ACCESS_TOKEN)
            .or_else(|| lookup(ENV_BOT_TOKEN))
            .ok_or_else(|| {
                SlackError::Config(format!("{} not set", ENV_ACCESS_TOKEN))
            })?;

        if !access_token.starts_with("xoxb-") && !access_token.starts_with("xoxp-") {
            warn!("Access token doesn't start with 'xoxb-' or 'xoxp-', this may be incorrect");
        }

        let mut config = Self::new(access_token);

        if let Some(api_base) = lookup(ENV_API_BASE) {
            config = config.with_api_base(api_base);
        }

        if let Some(page_size) = lookup(ENV_PAGE_SIZE) {
            let page_size = page_size.trim().parse().map_err(|_| {
                SlackError::Config(format!("{} must be a positive integer", ENV_PAGE_SIZE))
            })?;
            config = config.with_page_size(page_size);
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                SlackError::Config(format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        debug!("Loaded Slack config from environment: {:?}", config);
        Ok(config)
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Full URL of a Web API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.access_token.expose_secret().trim().is_empty() {
            return Err(SlackError::Config("Access token is empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(SlackError::Config(
                "Page size must be greater than zero".to_string(),
            ));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(SlackError::Config(format!(
                "API base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(SlackError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
