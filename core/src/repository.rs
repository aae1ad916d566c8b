//! Repository traits over the platform's record stores.
//!
//! The pipeline never depends on a specific query language; these traits
//! are the seam between the services and whatever backs them (PostgreSQL
//! in production, in-memory doubles in tests). All implementations are
//! injected explicitly; there is no module-level singleton client.

use crate::error::Result;
use crate::types::{
    EventId, EventRecord, JobId, MintJob, NewTicket, Ticket, TicketId,
};
use async_trait::async_trait;
use chrono::Duration;
use primitive_types::U256;

/// Per-event ticket counts grouped by mint status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketStatusCounts {
    /// Total tickets issued for the event.
    pub total: u64,
    /// Minted or transferred tickets.
    pub minted: u64,
    /// Tickets awaiting their first mint attempt.
    pub pending: u64,
    /// Tickets whose last mint attempt failed.
    pub failed: u64,
}

/// Event read model access.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Get an event by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event does not exist, `Persistence` on
    /// query failure.
    async fn get(&self, event_id: EventId) -> Result<EventRecord>;

    /// Insert an event record.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the id already exists, `Persistence` on
    /// query failure.
    async fn insert(&self, event: &EventRecord) -> Result<()>;
}

/// Ticket persistence.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Get a ticket by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ticket does not exist, `Persistence` on
    /// query failure.
    async fn get(&self, ticket_id: TicketId) -> Result<Ticket>;

    /// Highest allocated ticket number for an event, `0` if none.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    async fn max_ticket_number(&self, event_id: EventId) -> Result<i64>;

    /// Persist an issuance batch as a single atomic unit.
    ///
    /// Either every ticket row is created or none are; a duplicate
    /// `(event_id, ticket_number)` aborts the whole batch.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` on a numbering collision (the issuance should be
    /// retried from allocation), `Persistence` on any other write failure.
    async fn insert_batch(&self, tickets: &[NewTicket]) -> Result<Vec<Ticket>>;

    /// All tickets for an event ordered by ticket number.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>>;

    /// Ticket counts grouped by mint status; all zeros for an event with
    /// no tickets.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    async fn status_counts(&self, event_id: EventId) -> Result<TicketStatusCounts>;

    /// Record a confirmed mint: every listed ticket becomes `Minted` with
    /// its paired token id, in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if any ticket is missing, `Persistence` on
    /// write failure.
    async fn mark_minted(&self, outcomes: &[(TicketId, U256)]) -> Result<()>;

    /// Record a failed mint attempt for every listed ticket.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on write failure.
    async fn mark_failed(&self, ticket_ids: &[TicketId]) -> Result<()>;

    /// Delete one ticket, permitted only while its mint status is
    /// `Pending` or `Failed`. The status check runs inside the same
    /// statement as the delete so a concurrent mint cannot slip past it.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the ticket is minted or transferred,
    /// `NotFound` if it does not exist, `Persistence` on write failure.
    async fn delete(&self, ticket_id: TicketId) -> Result<()>;

    /// Delete every still-deletable ticket of an event, leaving minted
    /// and transferred rows untouched. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on write failure.
    async fn delete_by_event(&self, event_id: EventId) -> Result<u64>;
}

/// Durable queue of mint jobs.
///
/// The queue owns job lifecycle state and nothing else: it never mutates
/// ticket rows. Jobs are mutated only by the minter (processing→minted or
/// processing→failed) and the retry path (failed→pending).
#[async_trait]
pub trait MintQueue: Send + Sync {
    /// Create one job with `status = Pending` binding `ticket_refs` in
    /// their given order. The order is positional truth for metadata URIs
    /// and returned token ids and must never be re-sorted.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty batch, `Persistence` on write
    /// failure.
    async fn enqueue(&self, event_id: EventId, ticket_refs: Vec<TicketId>) -> Result<MintJob>;

    /// Get a job by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job does not exist, `Persistence` on
    /// query failure.
    async fn get(&self, job_id: JobId) -> Result<MintJob>;

    /// All jobs for an event, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<MintJob>>;

    /// Pending jobs in FIFO order, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on query failure.
    async fn list_pending(&self, limit: usize) -> Result<Vec<MintJob>>;

    /// Claim a job: compare-and-swap `Pending` → `Processing`, stamping
    /// the claim time and incrementing `retry_count`. At most one caller
    /// can win the claim; everyone else gets `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the job is not currently pending, `NotFound`
    /// if it does not exist, `Persistence` on write failure.
    async fn mark_processing(&self, job_id: JobId) -> Result<MintJob>;

    /// Transition `Processing` → `Minted` and stamp `processed_at`.
    /// `token_ids` must pair positionally with the job's `ticket_refs`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the token count does not match the ref
    /// count, `Conflict` if the job is not processing, `Persistence` on
    /// write failure.
    async fn mark_minted(&self, job_id: JobId, token_ids: &[U256]) -> Result<()>;

    /// Transition `Processing` → `Failed`, recording the error and
    /// stamping `processed_at`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the job is not processing, `Persistence` on
    /// write failure.
    async fn mark_failed(&self, job_id: JobId, error_message: &str) -> Result<()>;

    /// Reset every failed job of an event to `Pending`, zeroing
    /// `retry_count` and clearing the error. Jobs in any other status are
    /// untouched. Returns the number of jobs reset.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on write failure.
    async fn reset_failed(&self, event_id: EventId) -> Result<u64>;

    /// Fail every job stuck in `Processing` whose claim is older than
    /// `older_than`, so a crashed worker cannot strand a job. Returns the
    /// reclaimed jobs so the caller can fail their tickets too.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on write failure.
    async fn reclaim_stale(&self, older_than: Duration) -> Result<Vec<MintJob>>;
}
