//! Operator-triggered recovery of failed mint jobs.

use std::sync::Arc;
use ticketmint_core::{EventId, MintQueue, Result};

/// Resets failed queue entries so the worker picks them up again.
///
/// Purely a state transition: nothing is resubmitted to the chain here,
/// and retries are never automatic, so on-chain cost stays under human
/// control.
pub struct RetryCoordinator {
    queue: Arc<dyn MintQueue>,
}

impl RetryCoordinator {
    /// Create a coordinator over the queue.
    #[must_use]
    pub fn new(queue: Arc<dyn MintQueue>) -> Self {
        Self { queue }
    }

    /// Reset every failed job of the event to pending. Idempotent:
    /// with no failed jobs it returns 0 and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on write failure.
    pub async fn retry(&self, event_id: EventId) -> Result<u64> {
        let reset = self.queue.reset_failed(event_id).await?;

        tracing::info!(event_id = %event_id, reset, "Mint retry requested");

        Ok(reset)
    }
}
