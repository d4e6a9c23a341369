//! Error types for the sync pipeline.
//!
//! Two layers:
//! - [`DirectoryError`] is what a [`DirectoryClient`](crate::DirectoryClient)
//!   reports for a single remote call.
//! - [`SyncError`] is what a sync run fails with. Invite batch failures are
//!   not errors at this level; they are recorded in the
//!   [`DispatchReport`](crate::DispatchReport).

use std::fmt;

use thiserror::Error;

/// Broad category of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryErrorKind {
    /// Credential missing, invalid or revoked.
    Auth,
    /// The remote does not know the requested conversation or member.
    NotFound,
    /// The remote asked us to slow down.
    RateLimited,
    /// No answer within the call timeout.
    Timeout,
    /// Connection or transport failure.
    Network,
    /// The remote answered with something we could not interpret.
    InvalidResponse,
    /// The remote rejected the call for another reason.
    Api,
}

impl DirectoryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::InvalidResponse => "invalid_response",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for DirectoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single remote call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DirectoryError {
    /// Failure category.
    pub kind: DirectoryErrorKind,
    /// Human-readable detail (never contains the credential).
    pub message: String,
    /// Seconds the remote asked us to wait, for [`DirectoryErrorKind::RateLimited`].
    pub retry_after_secs: Option<u64>,
}

impl DirectoryError {
    pub fn new(kind: DirectoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(DirectoryErrorKind::Timeout, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(DirectoryErrorKind::InvalidResponse, message)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            kind: DirectoryErrorKind::RateLimited,
            message: format!("retry after {} seconds", retry_after_secs),
            retry_after_secs: Some(retry_after_secs),
        }
    }
}

/// Remote operation that was running when a [`SyncError::Upstream`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListConversations,
    ListMembers,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListConversations => "list conversations",
            Self::ListMembers => "list members",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Invalid invocation; raised before any remote call.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A channel name did not match any known conversation.
    #[error("Conversation not found: {name}")]
    NotFound {
        /// The name exactly as supplied by the caller.
        name: String,
    },

    /// A remote call needed to build the membership view failed.
    #[error("Upstream error while trying to {operation} for {subject}: {source}")]
    Upstream {
        operation: Operation,
        /// Channel name or conversation id the call was about.
        subject: String,
        #[source]
        source: DirectoryError,
    },

    /// The run was interrupted before the membership view was complete.
    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn upstream(
        operation: Operation,
        subject: impl Into<String>,
        source: DirectoryError,
    ) -> Self {
        Self::Upstream {
            operation,
            subject: subject.into(),
            source,
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::NotFound { .. } => "not_found",
            Self::Upstream { .. } => "upstream",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
