//! Ticket issuance: numbering, metadata, atomic batch persistence.
//!
//! Ticket-number allocation is the one operation that must be serialized
//! per event: two concurrent requests reading the same max number would
//! otherwise both allocate the same range. The issuer holds a per-event
//! async lock across read-allocate-insert; the repository's unique
//! constraint on `(event_id, ticket_number)` is the backstop if a second
//! process bypasses the lock. Issuance for different events runs in
//! parallel.

use crate::minter::BlockchainMinter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use ticketmint_core::{
    build_ticket_metadata, CoreError, EventId, EventRepository, JobId, MintQueue, NewTicket,
    Result, Ticket, TicketId, TicketRepository, TicketTemplate,
};

/// Upper bound on tickets per issuance request.
pub const MAX_QUANTITY: u32 = 1000;

/// How issued tickets reach the chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MintMode {
    /// Enqueue a job for the worker to drain. Default: isolates the
    /// unreliable external call from the transactional issuance path.
    #[default]
    Queued,
    /// Mint synchronously within the issuance call. The job record is
    /// still created first so mint state is never untracked.
    Immediate,
}

/// A request to issue a batch of tickets for an event.
#[derive(Clone, Debug, Deserialize)]
pub struct IssueRequest {
    /// Event to issue for.
    pub event_id: EventId,
    /// Base ticket name.
    pub ticket_name: String,
    /// Number of tickets to create, 1..=1000.
    pub quantity: u32,
    /// Optional face price.
    pub price: Option<f64>,
    /// Optional artwork URI.
    pub image_url: Option<String>,
    /// Optional description override.
    pub description: Option<String>,
    /// Optional ticket class.
    pub ticket_type: Option<String>,
}

/// How the batch's mint was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueMintStatus {
    /// Tokens confirmed on chain during the request (immediate mode).
    Minted,
    /// A mint job is queued for the worker.
    Queued,
}

/// Outcome of a successful issuance request.
#[derive(Clone, Debug)]
pub struct IssueOutcome {
    /// The created tickets, in ticket-number order.
    pub tickets: Vec<Ticket>,
    /// First allocated ticket number.
    pub starting_number: i64,
    /// The mint job bound to this batch.
    pub job_id: JobId,
    /// Dispatch result.
    pub mint_status: IssueMintStatus,
}

/// Per-event async locks guarding number allocation.
#[derive(Clone, Default)]
struct EventLocks {
    inner: Arc<Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl EventLocks {
    fn for_event(&self, event_id: EventId) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .inner
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?;
        Ok(Arc::clone(
            locks.entry(event_id).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        ))
    }
}

/// Allocates ticket numbers and persists issuance batches.
pub struct TicketIssuer {
    events: Arc<dyn EventRepository>,
    tickets: Arc<dyn TicketRepository>,
    queue: Arc<dyn MintQueue>,
    minter: Arc<BlockchainMinter>,
    mode: MintMode,
    locks: EventLocks,
}

impl TicketIssuer {
    /// Create an issuer over the given collaborators.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventRepository>,
        tickets: Arc<dyn TicketRepository>,
        queue: Arc<dyn MintQueue>,
        minter: Arc<BlockchainMinter>,
        mode: MintMode,
    ) -> Self {
        Self {
            events,
            tickets,
            queue,
            minter,
            mode,
            locks: EventLocks::default(),
        }
    }

    /// Issue a batch of tickets.
    ///
    /// The batch persists atomically: either all `quantity` tickets are
    /// created or none are. In queued mode the request succeeds
    /// independently of the eventual mint outcome.
    ///
    /// # Errors
    ///
    /// - `Validation` for an out-of-range quantity, empty name, negative
    ///   price, or an event with no minting configuration.
    /// - `NotFound` when the event does not exist.
    /// - `Conflict`/`Persistence` when the batch insert fails; no tickets
    ///   are left behind.
    /// - `ExternalService` in immediate mode when the synchronous mint
    ///   fails; the tickets and the failed job remain for retry.
    pub async fn issue(&self, request: IssueRequest) -> Result<IssueOutcome> {
        Self::validate(&request)?;

        let event = self.events.get(request.event_id).await?;
        if event.minting_config().is_none() {
            return Err(CoreError::Validation(format!(
                "event {} has no minting configuration",
                event.event_id
            )));
        }

        let template = TicketTemplate {
            ticket_name: request.ticket_name.clone(),
            description: request.description.clone(),
            image_url: request.image_url.clone(),
            ticket_type: request.ticket_type.clone(),
            price: request.price,
        };
        let quantity = i64::from(request.quantity);

        // Critical section: read max, allocate the range, insert the batch.
        let lock = self.locks.for_event(request.event_id)?;
        let created = {
            let _guard = lock.lock().await;

            let starting_number = self.tickets.max_ticket_number(request.event_id).await? + 1;
            let batch: Vec<NewTicket> = (0..quantity)
                .map(|i| {
                    let ticket_number = starting_number + i;
                    NewTicket {
                        ticket_id: TicketId::new(),
                        event_id: request.event_id,
                        ticket_number,
                        total_tickets_in_group: quantity,
                        nft_metadata: build_ticket_metadata(
                            &event.name,
                            &template,
                            ticket_number,
                            quantity,
                        ),
                    }
                })
                .collect();

            self.tickets.insert_batch(&batch).await?
        };

        let starting_number = created[0].ticket_number;
        let refs: Vec<TicketId> = created.iter().map(|t| t.ticket_id).collect();
        let job = self.queue.enqueue(request.event_id, refs).await?;

        tracing::info!(
            event_id = %request.event_id,
            job_id = %job.job_id,
            quantity = created.len(),
            starting_number,
            mode = ?self.mode,
            "Tickets issued"
        );

        let mint_status = match self.mode {
            MintMode::Queued => IssueMintStatus::Queued,
            MintMode::Immediate => {
                self.minter.process(job.job_id).await?;
                IssueMintStatus::Minted
            }
        };

        // In immediate mode the write-backs changed the rows we hold;
        // re-read so the outcome reflects persisted state.
        let tickets = if mint_status == IssueMintStatus::Minted {
            let mut fresh = Vec::with_capacity(created.len());
            for ticket in &created {
                fresh.push(self.tickets.get(ticket.ticket_id).await?);
            }
            fresh
        } else {
            created
        };

        Ok(IssueOutcome {
            tickets,
            starting_number,
            job_id: job.job_id,
            mint_status,
        })
    }

    fn validate(request: &IssueRequest) -> Result<()> {
        if request.quantity == 0 || request.quantity > MAX_QUANTITY {
            return Err(CoreError::Validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY}, got {}",
                request.quantity
            )));
        }
        if request.ticket_name.trim().is_empty() {
            return Err(CoreError::Validation("ticket_name must not be empty".to_string()));
        }
        if request.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(CoreError::Validation("price must be a non-negative number".to_string()));
        }
        Ok(())
    }
}
