//! Error types for the Slack directory client.
//!
//! Slack reports most failures as HTTP 200 with `"ok": false` and an error
//! code. Those codes are turned into [`SlackError`] variants here, and
//! [`SlackError`] is then folded into the transport-neutral
//! [`DirectoryError`] the sync pipeline understands.

use inviteme_core::{DirectoryError, DirectoryErrorKind};
use thiserror::Error;

/// Errors that can occur while talking to the Slack Web API.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (invalid token, revoked, missing scope).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API request failed.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel not found or not visible to the token.
    #[error("Channel error: {0}")]
    Channel(String),

    /// User not found.
    #[error("User error: {0}")]
    User(String),

    /// Well-formed JSON that does not have the expected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            SlackError::Json(err.to_string())
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

/// Default wait when Slack rate limits without a usable `Retry-After`.
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Represents a Slack API response error.
#[derive(Debug, Clone)]
pub struct SlackApiError {
    /// Error code from Slack (e.g., "channel_not_found").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl SlackApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<SlackApiError> for SlackError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            "ratelimited" | "rate_limited" => SlackError::RateLimited {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
            },
            "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked"
            | "token_expired" | "missing_scope" => SlackError::Auth(err.message),
            "channel_not_found" | "not_in_channel" | "is_archived" => {
                SlackError::Channel(err.message)
            }
            "user_not_found" | "user_disabled" => SlackError::User(err.message),
            "invalid_cursor" => SlackError::InvalidPayload(err.message),
            _ => SlackError::Api(format!("{}: {}", err.code, err.message)),
        }
    }
}

impl From<SlackError> for DirectoryError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::RateLimited { retry_after_secs } => {
                DirectoryError::rate_limited(retry_after_secs)
            }
            SlackError::Auth(msg) => DirectoryError::new(DirectoryErrorKind::Auth, msg),
            SlackError::Channel(msg) | SlackError::User(msg) => {
                DirectoryError::new(DirectoryErrorKind::NotFound, msg)
            }
            SlackError::Timeout(msg) => DirectoryError::timeout(msg),
            SlackError::Network(msg) => DirectoryError::new(DirectoryErrorKind::Network, msg),
            SlackError::Json(msg) | SlackError::InvalidPayload(msg) => {
                DirectoryError::invalid_response(msg)
            }
            SlackError::Config(msg) | SlackError::Api(msg) | SlackError::Internal(msg) => {
                DirectoryError::new(DirectoryErrorKind::Api, msg)
            }
        }
    }
}
