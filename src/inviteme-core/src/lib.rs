//! Membership sync between two conversations of a chat directory.
//!
//! The pipeline resolves two channel names, reads both full memberships
//! through a cursor-paginated listing, computes the members missing from the
//! target and invites them in bounded batches.
//!
//! The remote side is abstracted by [`DirectoryClient`]; `inviteme-slack`
//! provides the Slack Web API implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inviteme_core::{SyncOptions, Synchronizer};
//!
//! let sync = Synchronizer::new(Arc::new(client), SyncOptions::default());
//! let report = sync.sync("#general", "#random").await?;
//! println!("invited {}", report.dispatch.invited_count());
//! ```

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod options;
pub mod paginator;
pub mod resolver;
pub mod synchronizer;
pub mod types;

pub use client::DirectoryClient;
pub use dispatcher::{
    BatchDispatcher, BatchOutcome, BatchStatus, DispatchReport, ProgressFn, partition_batches,
};
pub use error::{DirectoryError, DirectoryErrorKind, Operation, SyncError, SyncResult};
pub use options::{DEFAULT_CALL_TIMEOUT, MAX_INVITE_BATCH, SyncOptions};
pub use paginator::Paginator;
pub use resolver::Resolver;
pub use synchronizer::{
    ConversationSnapshot, SyncPlan, SyncReport, Synchronizer, members_to_invite, missing_members,
    validate_pair,
};
pub use types::{
    CHANNEL_MARKER, Conversation, ConversationId, Cursor, MemberId, MembersPage, MembershipSet,
    normalize_name,
};
