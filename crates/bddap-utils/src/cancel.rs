//! Cooperative cancellation shared between a caller and a running batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::BddapError;

/// Shared cancellation signal checked by simulation, generation and flow
/// loops before every external call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new non-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Checkpoint: fail with `BddapError::Cancelled` if cancelled.
    pub fn check(&self, operation: &str) -> Result<(), BddapError> {
        if self.is_cancelled() {
            return Err(BddapError::Cancelled {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}
