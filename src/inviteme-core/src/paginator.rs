//! Full membership retrieval over a cursor-paginated listing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{DirectoryClient, bounded};
use crate::error::{DirectoryError, Operation, SyncError, SyncResult};
use crate::types::{ConversationId, Cursor, MembershipSet};

/// Walks every page of a conversation's membership.
///
/// All or nothing: a failed page discards what was collected so far, so
/// callers never see a partial membership view.
pub struct Paginator {
    client: Arc<dyn DirectoryClient>,
    call_timeout: Duration,
    cancel_token: CancellationToken,
}

impl Paginator {
    pub fn new(client: Arc<dyn DirectoryClient>, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Stop between pages once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Fetch every member of `conversation`, deduplicated.
    pub async fn fetch_all_members(
        &self,
        conversation: &ConversationId,
    ) -> SyncResult<MembershipSet> {
        let mut members = MembershipSet::new();
        let mut cursor: Option<Cursor> = None;
        let mut sent: HashSet<Cursor> = HashSet::new();
        let mut pages = 0usize;

        loop {
            if self.cancel_token.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let page = bounded(
                self.call_timeout,
                self.client.list_members(conversation, cursor.as_ref()),
            )
            .await
            .map_err(|e| SyncError::upstream(Operation::ListMembers, conversation.as_str(), e))?;
            pages += 1;

            let received = page.members.len();
            members.extend(page.members);
            debug!(
                "{} page {}: {} members, {} unique so far",
                conversation,
                pages,
                received,
                members.len()
            );

            let Some(next) = page.next_cursor.as_deref().and_then(Cursor::from_remote) else {
                break;
            };

            // A cursor already sent means the remote is cycling.
            if !sent.insert(next.clone()) {
                return Err(SyncError::upstream(
                    Operation::ListMembers,
                    conversation.as_str(),
                    DirectoryError::invalid_response(format!(
                        "cursor repeated after page {}",
                        pages
                    )),
                ));
            }
            cursor = Some(next);
        }

        info!(
            "Fetched {} members of {} in {} page(s)",
            members.len(),
            conversation,
            pages
        );
        Ok(members)
    }
}
