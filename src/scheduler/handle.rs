//! Timer handles owned by job slots

use tokio::task::AbortHandle;

/// Opaque handle to a live timer task.
///
/// Owned by exactly one job slot. Cancelling consumes the handle, and
/// dropping it cancels the timer, so a cleared slot can never leave a timer
/// behind. Cancellation stops future firings only: invocations already
/// spawned by the timer run to completion.
#[derive(Debug)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    pub(crate) fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// Cancel the timer
    pub fn cancel(self) {
        drop(self);
    }

    /// The timer task has run to completion (one-shot fired) or was cancelled
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
