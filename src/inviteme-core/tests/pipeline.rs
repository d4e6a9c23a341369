//! End-to-end tests of the sync pipeline against a recording stub.

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inviteme_core::{
    BatchOutcome, BatchStatus, ConversationId, DEFAULT_CALL_TIMEOUT, DirectoryErrorKind, MemberId,
    MembersPage, MembershipSet, Operation, Paginator, SyncError, SyncOptions, Synchronizer,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{Call, StubDirectory, member_ids};

fn synchronizer(stub: &Arc<StubDirectory>) -> Synchronizer {
    Synchronizer::new(stub.clone(), SyncOptions::default())
}

fn sorted(members: &[String]) -> Vec<String> {
    let mut members = members.to_vec();
    members.sort();
    members
}

#[tokio::test]
async fn test_invites_only_missing_members() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A", "B", "C"])
            .with_conversation("C2", "target", &["B", "D"]),
    );

    let report = synchronizer(&stub).sync("#source", "target").await.unwrap();

    assert_eq!(report.to_invite, 2);
    assert_eq!(report.source.member_count, 3);
    assert_eq!(report.target.member_count, 2);
    assert_eq!(report.dispatch.total(), 1);
    assert_eq!(report.dispatch.succeeded(), 1);
    assert_eq!(report.dispatch.failed(), 0);
    assert!(!report.is_partial_failure());

    let invites = stub.invite_calls();
    assert_eq!(invites.len(), 1);
    assert_eq!(sorted(&invites[0]), vec!["A".to_string(), "C".to_string()]);

    let targets: Vec<String> = stub
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Invite { conversation, .. } => Some(conversation),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec!["C2".to_string()]);
}

#[tokio::test]
async fn test_forty_five_members_with_failed_second_batch() {
    let ids = member_ids("U", 45);
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "big", &refs)
            .with_conversation("C2", "empty", &[])
            .failing_invite(2),
    );

    let report = synchronizer(&stub).sync("big", "empty").await.unwrap();
    let dispatch = &report.dispatch;

    let sizes: Vec<usize> = dispatch.batches.iter().map(|b| b.members.len()).collect();
    assert_eq!(sizes, vec![20, 20, 5]);

    let statuses: Vec<(usize, bool)> = dispatch
        .batches
        .iter()
        .map(|b| (b.index, b.is_success()))
        .collect();
    assert_eq!(statuses, vec![(1, true), (2, false), (3, true)]);

    assert_eq!(dispatch.succeeded(), 2);
    assert_eq!(dispatch.failed(), 1);
    assert_eq!(dispatch.invited_count(), 25);
    assert!(report.is_partial_failure());

    let failed = dispatch.failed_batches().next().unwrap();
    assert_eq!(failed.error().map(|e| e.message.as_str()), Some("cant_invite"));

    // Every candidate was attempted exactly once.
    let attempted: Vec<String> = stub.invite_calls().into_iter().flatten().collect();
    let unique: HashSet<&String> = attempted.iter().collect();
    assert_eq!(attempted.len(), 45);
    assert_eq!(unique.len(), 45);
}

#[tokio::test]
async fn test_page_failure_aborts_before_any_invite() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_paged_conversation("C1", "source", vec![vec!["A"], vec!["B"], vec!["C"]])
            .with_conversation("C2", "target", &["D"])
            .failing_page("C1", 1),
    );

    let err = synchronizer(&stub).sync("source", "target").await.unwrap_err();

    match err {
        SyncError::Upstream {
            operation,
            subject,
            source,
        } => {
            assert_eq!(operation, Operation::ListMembers);
            assert_eq!(subject, "C1");
            assert_eq!(source.kind, DirectoryErrorKind::Network);
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test]
async fn test_same_channel_makes_no_calls() {
    let stub = Arc::new(StubDirectory::new().with_conversation("C1", "general", &["A"]));

    let err = synchronizer(&stub).sync("#general", "general").await.unwrap_err();

    assert!(matches!(err, SyncError::Usage(_)));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_channel_reports_name_as_given() {
    let stub = Arc::new(StubDirectory::new().with_conversation("C1", "general", &["A"]));

    let err = synchronizer(&stub).sync("#general", "#General").await.unwrap_err();

    match err {
        SyncError::NotFound { name } => assert_eq!(name, "#General"),
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test]
async fn test_empty_source_invites_nobody() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "quiet", &[])
            .with_conversation("C2", "busy", &["A", "B"]),
    );

    let report = synchronizer(&stub).sync("quiet", "busy").await.unwrap();

    assert_eq!(report.to_invite, 0);
    assert_eq!(report.dispatch.total(), 0);
    assert!(!report.is_partial_failure());
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test]
async fn test_already_synced_is_idempotent() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A", "B"])
            .with_conversation("C2", "target", &["A", "B", "C"]),
    );

    let report = synchronizer(&stub).sync("source", "target").await.unwrap();

    assert_eq!(report.to_invite, 0);
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test]
async fn test_membership_independent_of_page_split() {
    let ids = member_ids("U", 23);

    for chunk in 1..=ids.len() {
        let pages: Vec<Vec<&str>> = ids
            .chunks(chunk)
            .map(|page| page.iter().map(String::as_str).collect())
            .collect();
        let page_count = pages.len();
        let stub = Arc::new(StubDirectory::new().with_paged_conversation("C1", "source", pages));

        let paginator = Paginator::new(stub.clone(), DEFAULT_CALL_TIMEOUT);
        let members = paginator
            .fetch_all_members(&ConversationId::new("C1"))
            .await
            .unwrap();

        let expected: MembershipSet = ids.iter().map(|id| MemberId::new(id.as_str())).collect();
        assert_eq!(members, expected, "chunk size {chunk}");
        assert_eq!(stub.member_cursors("C1").len(), page_count);
    }
}

#[tokio::test]
async fn test_duplicates_across_pages_are_collapsed() {
    let stub = Arc::new(StubDirectory::new().with_paged_conversation(
        "C1",
        "source",
        vec![vec!["A", "B"], vec!["B", "C"], vec![], vec!["A"]],
    ));

    let members = Paginator::new(stub.clone(), DEFAULT_CALL_TIMEOUT)
        .fetch_all_members(&ConversationId::new("C1"))
        .await
        .unwrap();

    assert_eq!(members.len(), 3);
}

#[tokio::test]
async fn test_cursor_is_sent_percent_encoded() {
    let stub = Arc::new(StubDirectory::new().with_raw_pages(
        "C1",
        "source",
        vec![
            MembersPage::with_next(["A"], "abc="),
            MembersPage::with_next(["B"], ""),
        ],
    ));

    let members = Paginator::new(stub.clone(), DEFAULT_CALL_TIMEOUT)
        .fetch_all_members(&ConversationId::new("C1"))
        .await
        .unwrap();

    assert_eq!(members.len(), 2);
    assert_eq!(
        stub.member_cursors("C1"),
        vec![None, Some("abc%3D".to_string())]
    );
}

#[tokio::test]
async fn test_stuck_cursor_is_rejected() {
    let stub = Arc::new(StubDirectory::new().with_raw_pages(
        "C1",
        "source",
        vec![
            MembersPage::with_next(["A"], "same"),
            MembersPage::with_next(["B"], "same"),
        ],
    ));

    let err = Paginator::new(stub.clone(), DEFAULT_CALL_TIMEOUT)
        .fetch_all_members(&ConversationId::new("C1"))
        .await
        .unwrap_err();

    match err {
        SyncError::Upstream { source, .. } => {
            assert_eq!(source.kind, DirectoryErrorKind::InvalidResponse)
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cursor_cycle_is_rejected() {
    let stub = Arc::new(StubDirectory::new().with_raw_pages(
        "C1",
        "source",
        vec![
            MembersPage::with_next(["A"], "A"),
            MembersPage::with_next(["B"], "B"),
            MembersPage::with_next(["C"], "A"),
        ],
    ));

    let err = Paginator::new(stub.clone(), DEFAULT_CALL_TIMEOUT)
        .fetch_all_members(&ConversationId::new("C1"))
        .await
        .unwrap_err();

    match err {
        SyncError::Upstream { source, .. } => {
            assert_eq!(source.kind, DirectoryErrorKind::InvalidResponse)
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(stub.member_cursors("C1").len(), 3);
}

#[tokio::test]
async fn test_listing_failure_aborts_before_any_invite() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A", "B"])
            .with_conversation("C2", "target", &[])
            .failing_listing(),
    );

    let err = synchronizer(&stub).sync("#source", "target").await.unwrap_err();

    match err {
        SyncError::Upstream {
            operation, source, ..
        } => {
            assert_eq!(operation, Operation::ListConversations);
            assert_eq!(source.kind, DirectoryErrorKind::Network);
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_member_page_times_out() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A"])
            .with_conversation("C2", "target", &[])
            .with_member_delay(Duration::from_secs(60)),
    );
    let options = SyncOptions::default().with_call_timeout(Duration::from_secs(5));

    let err = Synchronizer::new(stub.clone(), options)
        .sync("source", "target")
        .await
        .unwrap_err();

    match err {
        SyncError::Upstream {
            operation, source, ..
        } => {
            assert_eq!(operation, Operation::ListMembers);
            assert_eq!(source.kind, DirectoryErrorKind::Timeout);
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_source_pages_while_target_resolves() {
    // The target's name lookup is the second listing call and stalls.
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A", "B"])
            .with_conversation("C2", "target", &["B"])
            .delayed_listing(2, Duration::from_secs(10)),
    );
    let sync = synchronizer(&stub);
    let handle = tokio::spawn(async move { sync.sync("source", "target").await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(stub.member_cursors("C1"), vec![None]);
    assert!(stub.member_cursors("C2").is_empty());

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.to_invite, 1);
    assert_eq!(stub.invite_calls(), vec![vec!["A".to_string()]]);
}

#[tokio::test]
async fn test_cancelled_before_reading_members() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A"])
            .with_conversation("C2", "target", &[]),
    );
    let token = CancellationToken::new();
    token.cancel();

    let err = synchronizer(&stub)
        .with_cancel_token(token)
        .sync("source", "target")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Cancelled));
    assert!(stub.invite_calls().is_empty());
}

#[tokio::test]
async fn test_cancel_during_dispatch_skips_remaining_batches() {
    let ids = member_ids("U", 10);
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &refs)
            .with_conversation("C2", "target", &[]),
    );

    let token = CancellationToken::new();
    let cancel = token.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = seen.clone();

    let report = Synchronizer::new(stub.clone(), SyncOptions::default().with_batch_size(3))
        .with_cancel_token(token)
        .with_progress(Arc::new(move |outcome: &BatchOutcome| {
            seen_in_callback.lock().unwrap().push(outcome.index);
            cancel.cancel();
        }))
        .sync("source", "target")
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(report.dispatch.succeeded(), 1);
    assert_eq!(report.dispatch.skipped(), 3);
    assert!(matches!(report.dispatch.batches[3].status, BatchStatus::Skipped));
    assert!(report.is_partial_failure());
    assert_eq!(stub.invite_calls().len(), 1);
}

#[tokio::test]
async fn test_plan_does_not_write() {
    let stub = Arc::new(
        StubDirectory::new()
            .with_conversation("C1", "source", &["A", "B", "C"])
            .with_conversation("C2", "target", &["B", "D"]),
    );

    let plan = synchronizer(&stub).plan("source", "target").await.unwrap();

    let expected: MembershipSet = ["A", "C"].into_iter().map(MemberId::from).collect();
    assert_eq!(plan.to_invite, expected);
    assert_eq!(plan.source.id, ConversationId::new("C1"));
    assert_eq!(plan.target.id, ConversationId::new("C2"));
    assert!(stub.invite_calls().is_empty());
}
