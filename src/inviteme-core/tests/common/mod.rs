//! In-memory directory that records every call it receives.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use inviteme_core::{
    Conversation, ConversationId, Cursor, DirectoryClient, DirectoryError, DirectoryErrorKind,
    MemberId, MembersPage,
};

/// One call observed by [`StubDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListConversations,
    ListMembers {
        conversation: String,
        /// Cursor exactly as it would appear in the query string.
        cursor: Option<String>,
    },
    Invite {
        conversation: String,
        members: Vec<String>,
    },
}

#[derive(Default)]
pub struct StubDirectory {
    conversations: Vec<Conversation>,
    pages: HashMap<ConversationId, Vec<MembersPage>>,
    /// (conversation, 0-based page) pairs whose fetch fails.
    failing_pages: HashSet<(ConversationId, usize)>,
    /// 1-based invite calls that fail.
    failing_invites: HashSet<usize>,
    failing_listing: bool,
    /// 1-based listing calls that only answer after a delay.
    listing_delays: HashMap<usize, Duration>,
    member_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl StubDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversation whose members are served as the given pages.
    ///
    /// Page `i` links to page `i + 1` through a cursor ending in `=`.
    pub fn with_paged_conversation(mut self, id: &str, name: &str, pages: Vec<Vec<&str>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, members)| {
                if i + 1 < count {
                    MembersPage::with_next(members, format!("{}:page{}=", id, i + 1))
                } else {
                    MembersPage::last(members)
                }
            })
            .collect();
        self.conversations.push(Conversation::new(id, name));
        self.pages.insert(ConversationId::new(id), pages);
        self
    }

    /// Add a conversation whose members fit on one page.
    pub fn with_conversation(self, id: &str, name: &str, members: &[&str]) -> Self {
        self.with_paged_conversation(id, name, vec![members.to_vec()])
    }

    /// Add a conversation served with explicit pages (cursors included).
    pub fn with_raw_pages(mut self, id: &str, name: &str, pages: Vec<MembersPage>) -> Self {
        self.conversations.push(Conversation::new(id, name));
        self.pages.insert(ConversationId::new(id), pages);
        self
    }

    pub fn failing_page(mut self, id: &str, page: usize) -> Self {
        self.failing_pages.insert((ConversationId::new(id), page));
        self
    }

    pub fn failing_invite(mut self, call: usize) -> Self {
        self.failing_invites.insert(call);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.failing_listing = true;
        self
    }

    pub fn delayed_listing(mut self, call: usize, delay: Duration) -> Self {
        self.listing_delays.insert(call, delay);
        self
    }

    pub fn with_member_delay(mut self, delay: Duration) -> Self {
        self.member_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invite_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Invite { members, .. } => Some(members),
                _ => None,
            })
            .collect()
    }

    pub fn member_cursors(&self, id: &str) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListMembers {
                    conversation,
                    cursor,
                } if conversation == id => Some(cursor),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    /// Page index addressed by `cursor`, matching the transport form the
    /// pipeline is expected to send.
    fn page_index(pages: &[MembersPage], cursor: Option<&Cursor>) -> Option<usize> {
        let Some(cursor) = cursor else {
            return Some(0);
        };
        pages.iter().position(|page| {
            page.next_cursor
                .as_deref()
                .and_then(Cursor::from_remote)
                .is_some_and(|next| next == *cursor)
        })
        .map(|i| i + 1)
    }
}

#[async_trait]
impl DirectoryClient for StubDirectory {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, DirectoryError> {
        let call = self
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::ListConversations))
            .count()
            + 1;
        self.record(Call::ListConversations);

        if let Some(delay) = self.listing_delays.get(&call) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_listing {
            return Err(DirectoryError::new(DirectoryErrorKind::Network, "connection reset"));
        }
        Ok(self.conversations.clone())
    }

    async fn list_members(
        &self,
        conversation: &ConversationId,
        cursor: Option<&Cursor>,
    ) -> Result<MembersPage, DirectoryError> {
        self.record(Call::ListMembers {
            conversation: conversation.to_string(),
            cursor: cursor.map(|c| c.as_query_value().to_string()),
        });

        if let Some(delay) = self.member_delay {
            tokio::time::sleep(delay).await;
        }

        let pages = self.pages.get(conversation).ok_or_else(|| {
            DirectoryError::new(DirectoryErrorKind::NotFound, "channel_not_found")
        })?;
        let index = Self::page_index(pages, cursor)
            .ok_or_else(|| DirectoryError::new(DirectoryErrorKind::Api, "invalid_cursor"))?;

        if self.failing_pages.contains(&(conversation.clone(), index)) {
            return Err(DirectoryError::new(DirectoryErrorKind::Network, "connection reset"));
        }

        pages
            .get(index)
            .cloned()
            .ok_or_else(|| DirectoryError::new(DirectoryErrorKind::Api, "invalid_cursor"))
    }

    async fn invite_members(
        &self,
        conversation: &ConversationId,
        members: &[MemberId],
    ) -> Result<(), DirectoryError> {
        let invite_number = self
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Invite { .. }))
            .count()
            + 1;
        self.record(Call::Invite {
            conversation: conversation.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        });

        if self.failing_invites.contains(&invite_number) {
            return Err(DirectoryError::new(DirectoryErrorKind::Api, "cant_invite"));
        }
        Ok(())
    }
}

/// `count` member ids `U000`, `U001`, ...
pub fn member_ids(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{:03}", prefix, i)).collect()
}
