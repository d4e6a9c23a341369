//! Slack Web API backend for inviteme.
//!
//! Implements [`inviteme_core::DirectoryClient`] on top of three Web API
//! methods:
//! - `conversations.list` to resolve channel names
//! - `conversations.members` to read memberships page by page
//! - `conversations.invite` to add members in batches
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inviteme_core::{SyncOptions, Synchronizer};
//! use inviteme_slack::{SlackConfig, SlackDirectoryClient};
//!
//! let client = SlackDirectoryClient::new(SlackConfig::from_env()?)?;
//! let report = Synchronizer::new(Arc::new(client), SyncOptions::default())
//!     .sync("#general", "#random")
//!     .await?;
//! ```
//!
//! # Configuration
//!
//! Required environment variables:
//! - `SLACK_ACCESS_TOKEN` - OAuth token (xoxb-... or xoxp-...), `SLACK_BOT_TOKEN` is accepted too
//!
//! Optional:
//! - `SLACK_API_BASE` - API root, defaults to `https://slack.com/api`
//! - `SLACK_PAGE_SIZE` - Items per listing page, defaults to 200
//! - `SLACK_TIMEOUT_SECS` - HTTP request timeout, defaults to 30

pub mod api;
pub mod client;
pub mod config;
pub mod error;

// Re-export main types
pub use client::SlackDirectoryClient;
pub use config::SlackConfig;
pub use error::{SlackApiError, SlackError, SlackResult};
