//! Run-control types shared between the engine and its host.
//!
//! - [`CancellationToken`]: cooperative abort flag, polled by long-running work
//! - [`ProgressSink`]: receiver for percentage and status notifications

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag.
///
/// Clones share the same flag, so the host keeps one clone and hands
/// another to the worker running the job.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the token can be reused for a new run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Receiver for progress notifications.
///
/// Implementations must be cheap; they are called from the worker that runs
/// the job, possibly from several threads at once.
pub trait ProgressSink: Send + Sync {
    /// Percentage complete, 0..=100.
    fn percent(&self, value: u8);

    /// Human readable status line.
    fn status(&self, message: &str);

    /// Live preview of paths produced for one polygon.
    ///
    /// Coordinates are flattened `(x, y)` polylines. The default ignores them.
    fn preview(&self, _tool_id: u64, _paths: &[Vec<(f64, f64)>]) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn percent(&self, _value: u8) {}

    fn status(&self, _message: &str) {}
}
