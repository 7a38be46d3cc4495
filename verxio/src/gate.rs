//! Page readiness gating.
//!
//! A freshly mounted page reports "loading" for a minimum delay before it
//! reports "ready", so content is withheld until client-side context has had
//! a moment to resolve. The transition happens exactly once and never
//! reverses. Dropping the gate before the delay elapses cancels the pending
//! timer, so nothing fires against a torn-down page.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Minimum time a page reports "loading" before it becomes ready.
pub const DEFAULT_LOADER_DELAY: Duration = Duration::from_millis(400);

/// One-shot readiness gate driven by a background timer.
///
/// Created in the "loading" state; a spawned timer flips it to "ready" after
/// the configured delay. The timer is tied to the gate's lifetime through a
/// cancellation guard, so an early drop tears the timer down instead of
/// letting it fire late.
#[derive(Debug)]
pub struct LoaderGate {
    ready: watch::Receiver<bool>,
    _cancel: DropGuard,
}

impl LoaderGate {
    /// Starts a gate that becomes ready after `delay`.
    ///
    /// Must be called from within a Tokio runtime; the timer runs as a
    /// spawned task.
    #[must_use]
    pub fn start(delay: Duration) -> Self {
        let (tx, ready) = watch::channel(false);
        let token = CancellationToken::new();
        let timer = token.child_token();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    tracing::trace!(?delay, "loader gate ready");
                    let _ = tx.send(true);
                }
            }
        });
        Self {
            ready,
            _cancel: token.drop_guard(),
        }
    }

    /// Whether the gate has reached the ready state.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Waits until the gate is ready.
    ///
    /// Returns immediately once the transition has happened; the gate never
    /// goes back to loading.
    pub async fn ready(&self) {
        let mut rx = self.ready.clone();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Subscribes to the readiness state.
    ///
    /// The receiver observes at most one change, `false` to `true`. If the
    /// gate is dropped first the channel closes without that change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.clone()
    }
}
