use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared start/cancel flag for one queued task.
///
/// Exactly one of [`try_start`](Self::try_start) and
/// [`cancel`](Self::cancel) wins. A task that was cancelled before starting
/// is skipped; cancelling a running task has no effect on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<AtomicU8>,
}

impl CancellationToken {
    /// Builds a token in the pending state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the task to running. Returns `false` if it was cancelled first.
    pub fn try_start(&self) -> bool {
        self.state
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Cancels a pending task. Returns `true` if the task will now be skipped.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
