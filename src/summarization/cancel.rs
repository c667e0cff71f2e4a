/*!
 * Job-level cancellation signalling.
 *
 * A token is shared between a job and its in-flight inference calls;
 * cancelling it abandons queued calls and aborts in-flight ones at their
 * next suspension point. Tokens are one-shot: once cancelled, they stay
 * cancelled.
 */

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Shared cancellation flag with async notification
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    /// Set once, never cleared
    cancelled: AtomicBool,
    /// Wakes tasks parked in `cancelled()`
    notify: Notify,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every clone of this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is signalled
    pub async fn cancelled(&self) {
        // Register interest before re-checking the flag so a cancel()
        // between the check and the await cannot be missed
        let mut notified = pin!(self.inner.notify.notified());
        loop {
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }
}
