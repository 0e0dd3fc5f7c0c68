//! Cooperative cancellation for long-running path resolution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raised when a resolution was cancelled at one of its await points.
#[derive(Debug, thiserror::Error)]
#[error("path resolution cancelled")]
pub struct Cancelled;

/// Cloneable cancellation signal, checked at each await point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
