//! Cooperative run control
//!
//! Both signals are only observed at step boundaries. A generation call that
//! is already in flight always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cancellation and pause requests for one run. Clones share state, so a
/// clone can be handed to a signal handler or another task.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancellation_token: CancellationToken,
    pause_requested: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control driven by an existing token (e.g. a child of a shutdown token)
    pub fn with_token(cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            pause_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop before the next step starts
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Pause before the next step starts
    pub fn request_pause(&self) {
        self.pause_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::SeqCst)
    }

    /// Consume a pending pause request
    pub(crate) fn take_pause_request(&self) -> bool {
        self.pause_requested.swap(false, Ordering::SeqCst)
    }
}
