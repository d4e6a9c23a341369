//! Tunables for a sync run.

use std::time::Duration;

/// Maximum number of members a single invite call may carry.
pub const MAX_INVITE_BATCH: usize = 20;

/// Default upper bound for a single remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Options shared by the resolver, paginator and dispatcher.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Members per invite call; clamped to `1..=MAX_INVITE_BATCH`.
    pub batch_size: usize,
    /// Timeout applied to every remote call.
    pub call_timeout: Duration,
    /// Pause between two consecutive invite calls.
    pub batch_pause: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_INVITE_BATCH,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            batch_pause: Duration::ZERO,
        }
    }
}

impl SyncOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_batch_pause(mut self, batch_pause: Duration) -> Self {
        self.batch_pause = batch_pause;
        self
    }

    /// Batch size actually used when chunking.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_INVITE_BATCH)
    }
}
