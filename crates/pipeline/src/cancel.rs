//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, checked between time-window units.
///
/// Cancellation is cooperative: windows already in flight run to
/// completion, no further windows are started, and the run finishes
/// with whatever output was completed plus a report marking the rest
/// as cancelled. No partially written files are left behind because
/// export happens after the merge, atomically.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
