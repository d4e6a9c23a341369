//! End-to-end membership sync between two conversations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::DirectoryClient;
use crate::dispatcher::{BatchDispatcher, DispatchReport, ProgressFn};
use crate::error::{SyncError, SyncResult};
use crate::options::SyncOptions;
use crate::paginator::Paginator;
use crate::resolver::Resolver;
use crate::types::{ConversationId, MembershipSet, normalize_name};

/// Reject unusable channel pairs before any remote call is made.
pub fn validate_pair(source: &str, target: &str) -> SyncResult<()> {
    let source_name = normalize_name(source);
    let target_name = normalize_name(target);

    if source_name.is_empty() || target_name.is_empty() {
        return Err(SyncError::usage("both a source and a target channel are required"));
    }
    if source_name == target_name {
        return Err(SyncError::usage(format!(
            "source and target are the same channel '{}'",
            source_name
        )));
    }
    Ok(())
}

/// Members to add to the target: `(source ∪ target) \ target`.
pub fn members_to_invite(source: &MembershipSet, target: &MembershipSet) -> MembershipSet {
    source
        .union(target)
        .filter(|member| !target.contains(*member))
        .cloned()
        .collect()
}

/// Members of `source` absent from `target`: `source \ target`.
///
/// Always equal to [`members_to_invite`].
pub fn missing_members(source: &MembershipSet, target: &MembershipSet) -> MembershipSet {
    source.difference(target).cloned().collect()
}

/// Resolve `name`, then read its full membership.
async fn read_conversation(
    resolver: &Resolver,
    paginator: &Paginator,
    name: &str,
) -> SyncResult<(ConversationId, MembershipSet)> {
    let id = resolver.resolve(name).await?;
    let members = paginator.fetch_all_members(&id).await?;
    Ok((id, members))
}

/// A resolved conversation and how many members it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    /// Name as supplied by the caller.
    pub name: String,
    pub id: ConversationId,
    pub member_count: usize,
}

/// Everything known before the first write.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub source: ConversationSnapshot,
    pub target: ConversationSnapshot,
    pub to_invite: MembershipSet,
}

/// Result of a completed sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub source: ConversationSnapshot,
    pub target: ConversationSnapshot,
    /// Size of the invite set.
    pub to_invite: usize,
    pub dispatch: DispatchReport,
}

impl SyncReport {
    pub fn is_partial_failure(&self) -> bool {
        self.dispatch.is_partial_failure()
    }
}

/// Copies the membership of one conversation into another.
pub struct Synchronizer {
    client: Arc<dyn DirectoryClient>,
    options: SyncOptions,
    progress: Option<ProgressFn>,
    cancel_token: CancellationToken,
}

impl Synchronizer {
    pub fn new(client: Arc<dyn DirectoryClient>, options: SyncOptions) -> Self {
        Self {
            client,
            options,
            progress: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Resolve both names, read both memberships and compute the invite set.
    ///
    /// No write is made. Any failure aborts the whole plan.
    pub async fn plan(&self, source: &str, target: &str) -> SyncResult<SyncPlan> {
        validate_pair(source, target)?;

        let resolver = Resolver::new(Arc::clone(&self.client), self.options.call_timeout);
        let paginator = Paginator::new(Arc::clone(&self.client), self.options.call_timeout)
            .with_cancel_token(self.cancel_token.clone());

        let ((source_id, source_members), (target_id, target_members)) = tokio::try_join!(
            read_conversation(&resolver, &paginator, source),
            read_conversation(&resolver, &paginator, target)
        )?;

        let to_invite = members_to_invite(&source_members, &target_members);
        info!(
            "{} has {} members, {} has {}; {} to invite",
            source,
            source_members.len(),
            target,
            target_members.len(),
            to_invite.len()
        );

        Ok(SyncPlan {
            source: ConversationSnapshot {
                name: source.to_string(),
                id: source_id,
                member_count: source_members.len(),
            },
            target: ConversationSnapshot {
                name: target.to_string(),
                id: target_id,
                member_count: target_members.len(),
            },
            to_invite,
        })
    }

    /// Plan, then invite every missing member into the target.
    ///
    /// Returns `Err` only when the plan fails. Invite failures are in the
    /// report.
    pub async fn sync(&self, source: &str, target: &str) -> SyncResult<SyncReport> {
        let plan = self.plan(source, target).await?;
        Ok(self.execute(plan).await)
    }

    /// Dispatch the invites of an already computed plan.
    pub async fn execute(&self, plan: SyncPlan) -> SyncReport {
        let mut dispatcher = BatchDispatcher::new(Arc::clone(&self.client), &self.options)
            .with_cancel_token(self.cancel_token.clone());
        if let Some(progress) = &self.progress {
            dispatcher = dispatcher.with_progress(Arc::clone(progress));
        }

        let dispatch = dispatcher.dispatch(&plan.target.id, &plan.to_invite).await;
        SyncReport {
            to_invite: plan.to_invite.len(),
            source: plan.source,
            target: plan.target,
            dispatch,
        }
    }
}
