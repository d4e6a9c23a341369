//! Human-readable progress, summary and exit status of a run.
//!
//! Everything here returns strings so `main` decides where they go
//! (stdout for results, stderr for errors).

use inviteme_core::{BatchOutcome, BatchStatus, SyncError, SyncPlan, SyncReport, partition_batches};

/// Run completed, including "nothing to invite".
pub const EXIT_SUCCESS: u8 = 0;
/// Fatal error or interrupt.
pub const EXIT_FAILURE: u8 = 1;
/// Invalid invocation.
pub const EXIT_USAGE: u8 = 2;
/// At least one invite batch failed.
pub const EXIT_PARTIAL: u8 = 3;

/// One line per finished batch.
pub fn progress_line(outcome: &BatchOutcome, total: usize) -> String {
    let count = outcome.members.len();
    match &outcome.status {
        BatchStatus::Invited => format!(
            "batch {}/{}: {} members invited.",
            outcome.index, total, count
        ),
        BatchStatus::Failed { error } => format!(
            "batch {}/{}: failed to invite {} members: {}",
            outcome.index, total, count, error
        ),
        BatchStatus::Skipped => format!(
            "batch {}/{}: skipped {} members (interrupted)",
            outcome.index, total, count
        ),
    }
}

/// Final summary of a completed run.
pub fn summary_lines(report: &SyncReport) -> Vec<String> {
    if report.to_invite == 0 {
        return vec![format!(
            "Nothing to invite: every member of {} is already in {}.",
            report.source.name, report.target.name
        )];
    }

    let dispatch = &report.dispatch;
    let mut lines = vec![
        format!(
            "Invited {} of {} members from {} into {}.",
            dispatch.invited_count(),
            report.to_invite,
            report.source.name,
            report.target.name
        ),
        format!(
            "Batches: {} succeeded, {} failed, {} skipped.",
            dispatch.succeeded(),
            dispatch.failed(),
            dispatch.skipped()
        ),
    ];
    for batch in dispatch.failed_batches() {
        if let Some(error) = batch.error() {
            lines.push(format!(
                "  batch {} ({} members): {}",
                batch.index,
                batch.members.len(),
                error
            ));
        }
    }
    lines
}

/// What a dry run would do.
pub fn plan_lines(plan: &SyncPlan, batch_size: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}): {} members; {} ({}): {} members.",
        plan.source.name,
        plan.source.id,
        plan.source.member_count,
        plan.target.name,
        plan.target.id,
        plan.target.member_count
    )];

    let batches = partition_batches(&plan.to_invite, batch_size);
    if batches.is_empty() {
        lines.push("Nothing to invite.".to_string());
        return lines;
    }

    lines.push(format!(
        "Would invite {} members in {} batch(es):",
        plan.to_invite.len(),
        batches.len()
    ));
    for (i, batch) in batches.iter().enumerate() {
        let ids: Vec<&str> = batch.iter().map(|m| m.as_str()).collect();
        lines.push(format!("  batch {}: {}", i + 1, ids.join(", ")));
    }
    lines
}

pub fn error_line(err: &SyncError) -> String {
    format!("error ({}): {}", err.kind(), err)
}

pub fn error_exit_code(err: &SyncError) -> u8 {
    match err {
        SyncError::Usage(_) => EXIT_USAGE,
        SyncError::NotFound { .. } | SyncError::Upstream { .. } | SyncError::Cancelled => {
            EXIT_FAILURE
        }
    }
}

pub fn report_exit_code(report: &SyncReport, interrupted: bool) -> u8 {
    if interrupted {
        EXIT_FAILURE
    } else if report.dispatch.failed() > 0 {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}
