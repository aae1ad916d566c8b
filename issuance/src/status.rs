//! Read-only rollup of per-event mint state.

use std::sync::Arc;
use ticketmint_core::{EventId, MintQueue, MintSummary, Result, TicketRepository};

/// Aggregates ticket counts and queue history for an event.
///
/// Never mutates anything and never fails on absence of data: an event
/// with no tickets and no jobs yields zero counts and an empty list.
pub struct StatusAggregator {
    tickets: Arc<dyn TicketRepository>,
    queue: Arc<dyn MintQueue>,
}

impl StatusAggregator {
    /// Create an aggregator over the read paths.
    #[must_use]
    pub fn new(tickets: Arc<dyn TicketRepository>, queue: Arc<dyn MintQueue>) -> Self {
        Self { tickets, queue }
    }

    /// Build the mint summary for an event.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    pub async fn summary(&self, event_id: EventId) -> Result<MintSummary> {
        let counts = self.tickets.status_counts(event_id).await?;
        let queue_jobs = self.queue.list_by_event(event_id).await?;

        Ok(MintSummary {
            total_tickets: counts.total,
            minted: counts.minted,
            pending: counts.pending,
            failed: counts.failed,
            queue_jobs,
        })
    }
}
