//! Identifiers and collections shared by the sync pipeline.
//!
//! Every identifier is an opaque string compared by value. Nothing here
//! outlives a single sync run.

use std::collections::HashSet;
use std::fmt;

/// Marker character that may prefix a channel name (`#general`).
pub const CHANNEL_MARKER: char = '#';

/// Identifier of a directory member (e.g. `U024BE7LH`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(String);

impl MemberId {
    /// Create a member id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a channel or group (e.g. `C1234567890`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create a conversation id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Pagination continuation token in transport form.
///
/// Remote cursors frequently end in `=`; the token is percent-encoded once
/// when it is received so it can be placed verbatim into the next request's
/// query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a raw cursor returned by the remote side.
    ///
    /// Returns `None` for an empty token, which the remote uses to signal
    /// the last page.
    pub fn from_remote(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self(urlencoding::encode(raw).into_owned()))
    }

    /// The percent-encoded value to put after `cursor=`.
    pub fn as_query_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete, deduplicated membership of one conversation.
pub type MembershipSet = HashSet<MemberId>;

/// One entry of the conversation directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Remote identifier.
    pub id: ConversationId,
    /// Unprefixed, case-sensitive name.
    pub name: String,
}

impl Conversation {
    pub fn new(id: impl Into<ConversationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One page of a membership listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembersPage {
    /// Members on this page (may be empty, may repeat earlier pages).
    pub members: Vec<MemberId>,
    /// Raw next cursor as sent by the remote; `None` or empty on the last page.
    pub next_cursor: Option<String>,
}

impl MembersPage {
    /// Final page with the given members.
    pub fn last<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            next_cursor: None,
        }
    }

    /// Page followed by another page reachable through `next_cursor`.
    pub fn with_next<I, M>(members: I, next_cursor: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            next_cursor: Some(next_cursor.into()),
        }
    }
}

/// Strip a single leading [`CHANNEL_MARKER`] from a channel name.
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix(CHANNEL_MARKER).unwrap_or(name)
}
