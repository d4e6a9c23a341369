//! inviteme - copy the membership of one Slack channel into another.

mod output;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use inviteme_core::{BatchOutcome, MAX_INVITE_BATCH, SyncOptions, Synchronizer, validate_pair};
use inviteme_slack::{SlackConfig, SlackDirectoryClient};

/// Invite every member of one Slack channel into another
#[derive(Parser)]
#[command(name = "inviteme")]
#[command(about = "Invite every member of a source channel into a target channel")]
#[command(version)]
struct Args {
    /// Channel to copy members from (e.g. "#general")
    source: String,

    /// Channel to invite them into
    target: String,

    /// Members per invite call
    #[arg(
        long,
        default_value_t = MAX_INVITE_BATCH as u64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_INVITE_BATCH as u64)
    )]
    batch_size: u64,

    /// Timeout for each remote call, in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Pause between invite calls, in milliseconds
    #[arg(long, default_value_t = 0)]
    batch_pause_ms: u64,

    /// Compute and print the invite plan without inviting anyone
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Cancel `token` on Ctrl+C.
fn spawn_interrupt_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received Ctrl+C, stopping after the current call");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}

async fn run(args: Args) -> anyhow::Result<u8> {
    if let Err(e) = validate_pair(&args.source, &args.target) {
        eprintln!("{}", output::error_line(&e));
        return Ok(output::error_exit_code(&e));
    }

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
    let config = SlackConfig::from_env().context("Failed to load Slack configuration")?;
    let client = SlackDirectoryClient::new(config).context("Failed to create Slack client")?;

    let options = SyncOptions::default()
        .with_batch_size(args.batch_size as usize)
        .with_call_timeout(Duration::from_secs(args.timeout_secs))
        .with_batch_pause(Duration::from_millis(args.batch_pause_ms));
    let batch_size = options.effective_batch_size();

    let cancel_token = CancellationToken::new();
    spawn_interrupt_listener(cancel_token.clone());

    let synchronizer =
        Synchronizer::new(Arc::new(client), options).with_cancel_token(cancel_token.clone());

    let plan = match synchronizer.plan(&args.source, &args.target).await {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{}", output::error_line(&e));
            return Ok(output::error_exit_code(&e));
        }
    };

    if args.dry_run {
        for line in output::plan_lines(&plan, batch_size) {
            println!("{}", line);
        }
        return Ok(output::EXIT_SUCCESS);
    }

    let total = plan.to_invite.len().div_ceil(batch_size);
    let synchronizer = synchronizer.with_progress(Arc::new(move |outcome: &BatchOutcome| {
        println!("{}", output::progress_line(outcome, total));
    }));

    let report = synchronizer.execute(plan).await;
    for line in output::summary_lines(&report) {
        println!("{}", line);
    }

    let interrupted = cancel_token.is_cancelled();
    if interrupted {
        eprintln!("error (cancelled): interrupted before all batches were sent");
    }
    info!(
        "Run finished: {} invited, {} failed batch(es)",
        report.dispatch.invited_count(),
        report.dispatch.failed()
    );
    Ok(output::report_exit_code(&report, interrupted))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(output::EXIT_FAILURE)
        }
    }
}
