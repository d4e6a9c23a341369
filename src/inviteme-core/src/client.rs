//! Contract of the remote directory the pipeline talks to.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::types::{Conversation, ConversationId, Cursor, MemberId, MembersPage};

/// Remote directory of conversations and their members.
///
/// Implementations own transport, credentials and the remote URL scheme.
/// The pipeline only ever calls these three methods.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List every known conversation.
    ///
    /// If the remote listing is itself paginated, the implementation walks
    /// all of its pages before returning.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, DirectoryError>;

    /// Fetch one page of members of `conversation`.
    ///
    /// `cursor` is already in transport form and must be inserted into the
    /// request unchanged.
    async fn list_members(
        &self,
        conversation: &ConversationId,
        cursor: Option<&Cursor>,
    ) -> Result<MembersPage, DirectoryError>;

    /// Add `members` to `conversation` in a single write.
    async fn invite_members(
        &self,
        conversation: &ConversationId,
        members: &[MemberId],
    ) -> Result<(), DirectoryError>;
}

/// Run one remote call with an upper bound on how long it may take.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DirectoryError>
where
    F: Future<Output = Result<T, DirectoryError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::timeout(format!(
            "no response within {:?}",
            limit
        ))),
    }
}
