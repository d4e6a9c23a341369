//! Channel name to conversation id resolution.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::client::{DirectoryClient, bounded};
use crate::error::{Operation, SyncError, SyncResult};
use crate::types::{ConversationId, normalize_name};

/// Maps human-readable channel names to conversation ids.
pub struct Resolver {
    client: Arc<dyn DirectoryClient>,
    call_timeout: Duration,
}

impl Resolver {
    pub fn new(client: Arc<dyn DirectoryClient>, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    /// Resolve `name` (optionally `#`-prefixed) to its conversation id.
    ///
    /// Matching is exact and case-sensitive; the first matching entry wins.
    pub async fn resolve(&self, name: &str) -> SyncResult<ConversationId> {
        let wanted = normalize_name(name);
        debug!("Resolving conversation '{}'", wanted);

        let conversations = bounded(self.call_timeout, self.client.list_conversations())
            .await
            .map_err(|e| SyncError::upstream(Operation::ListConversations, name, e))?;

        let id = conversations
            .into_iter()
            .find(|conversation| conversation.name == wanted)
            .map(|conversation| conversation.id)
            .ok_or_else(|| SyncError::NotFound {
                name: name.to_string(),
            })?;

        debug!("Resolved '{}' to {}", wanted, id);
        Ok(id)
    }
}
