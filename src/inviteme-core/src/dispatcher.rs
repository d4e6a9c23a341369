//! Batched invite dispatch.
//!
//! Members are sorted, split into batches of at most
//! [`MAX_INVITE_BATCH`](crate::MAX_INVITE_BATCH) and written one batch at a
//! time. A failed batch is recorded and dispatch moves on to the next one.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{DirectoryClient, bounded};
use crate::error::DirectoryError;
use crate::options::SyncOptions;
use crate::types::{ConversationId, MemberId, MembershipSet};

/// Final state of one invite batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// The remote accepted the batch.
    Invited,
    /// The remote rejected the batch or the call did not complete.
    Failed { error: DirectoryError },
    /// Never sent because the run was interrupted.
    Skipped,
}

/// One batch and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// 1-based position in dispatch order.
    pub index: usize,
    pub members: Vec<MemberId>,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Invited)
    }

    pub fn error(&self) -> Option<&DirectoryError> {
        match &self.status {
            BatchStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Outcome of every batch of a dispatch, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub batches: Vec<BatchOutcome>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.batches.len()
    }

    pub fn succeeded(&self) -> usize {
        self.batches.iter().filter(|b| b.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.failed_batches().count()
    }

    pub fn skipped(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| matches!(b.status, BatchStatus::Skipped))
            .count()
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| b.error().is_some())
    }

    /// Members in batches the remote accepted.
    pub fn invited_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_success())
            .map(|b| b.members.len())
            .sum()
    }

    /// At least one batch was not delivered.
    pub fn is_partial_failure(&self) -> bool {
        self.failed() > 0 || self.skipped() > 0
    }
}

/// Callback invoked once per batch after its status is known.
pub type ProgressFn = Arc<dyn Fn(&BatchOutcome) + Send + Sync>;

/// Split `members` into sorted batches of at most `batch_size` entries.
///
/// Every member lands in exactly one batch; only the last batch may be
/// shorter than `batch_size`.
pub fn partition_batches(members: &MembershipSet, batch_size: usize) -> Vec<Vec<MemberId>> {
    let batch_size = batch_size.max(1);
    let mut pending: Vec<MemberId> = members.iter().cloned().collect();
    pending.sort();

    let mut pending: VecDeque<MemberId> = pending.into();
    let mut batches = Vec::with_capacity(pending.len().div_ceil(batch_size));
    while !pending.is_empty() {
        let take = batch_size.min(pending.len());
        batches.push(pending.drain(..take).collect());
    }
    batches
}

/// Writes invite batches sequentially against a [`DirectoryClient`].
pub struct BatchDispatcher {
    client: Arc<dyn DirectoryClient>,
    batch_size: usize,
    call_timeout: Duration,
    batch_pause: Duration,
    progress: Option<ProgressFn>,
    cancel_token: CancellationToken,
}

impl BatchDispatcher {
    pub fn new(client: Arc<dyn DirectoryClient>, options: &SyncOptions) -> Self {
        Self {
            client,
            batch_size: options.effective_batch_size(),
            call_timeout: options.call_timeout,
            batch_pause: options.batch_pause,
            progress: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stop sending once `token` is cancelled; unsent batches are reported
    /// as [`BatchStatus::Skipped`].
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Invite `members` into `target`.
    ///
    /// Never fails as a whole: per-batch failures are in the report.
    pub async fn dispatch(
        &self,
        target: &ConversationId,
        members: &MembershipSet,
    ) -> DispatchReport {
        let batches = partition_batches(members, self.batch_size);
        let total = batches.len();
        let mut report = DispatchReport {
            batches: Vec::with_capacity(total),
        };

        if total == 0 {
            debug!("Nothing to invite into {}", target);
            return report;
        }

        info!(
            "Inviting {} members into {} in {} batch(es)",
            members.len(),
            target,
            total
        );

        for (i, batch) in batches.into_iter().enumerate() {
            let index = i + 1;

            if index > 1 && !self.batch_pause.is_zero() {
                tokio::select! {
                    _ = self.cancel_token.cancelled() => {}
                    _ = tokio::time::sleep(self.batch_pause) => {}
                }
            }

            let status = if self.cancel_token.is_cancelled() {
                BatchStatus::Skipped
            } else {
                match bounded(self.call_timeout, self.client.invite_members(target, &batch)).await {
                    Ok(()) => {
                        debug!("Batch {}/{}: invited {} members", index, total, batch.len());
                        BatchStatus::Invited
                    }
                    Err(error) => {
                        warn!(
                            "Batch {}/{} into {} failed ({} members): {}",
                            index,
                            total,
                            target,
                            batch.len(),
                            error
                        );
                        BatchStatus::Failed { error }
                    }
                }
            };

            let outcome = BatchOutcome {
                index,
                members: batch,
                status,
            };
            if let Some(progress) = &self.progress {
                progress(&outcome);
            }
            report.batches.push(outcome);
        }

        info!(
            "Dispatch into {} finished: {} succeeded, {} failed, {} skipped",
            target,
            report.succeeded(),
            report.failed(),
            report.skipped()
        );
        report
    }
}
