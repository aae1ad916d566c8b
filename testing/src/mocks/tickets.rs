//! In-memory ticket repository.
//!
//! Mirrors the PostgreSQL semantics the pipeline relies on: batch inserts
//! are all-or-nothing, numbering collisions conflict, minted rows are
//! immutable, and deletion is guarded by mint status.

use async_trait::async_trait;
use chrono::Utc;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use ticketmint_core::{
    CoreError, EventId, MintStatus, NewTicket, Result, Ticket, TicketId, TicketRepository,
    TicketStatus, TicketStatusCounts,
};

/// In-memory [`TicketRepository`] for tests.
#[derive(Clone, Default)]
pub struct InMemoryTicketRepository {
    tickets: Arc<Mutex<HashMap<TicketId, Ticket>>>,
}

impl InMemoryTicketRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<TicketId, Ticket>>> {
        self.tickets
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn get(&self, ticket_id: TicketId) -> Result<Ticket> {
        self.guard()?
            .get(&ticket_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Ticket", ticket_id))
    }

    async fn max_ticket_number(&self, event_id: EventId) -> Result<i64> {
        Ok(self
            .guard()?
            .values()
            .filter(|t| t.event_id == event_id)
            .map(|t| t.ticket_number)
            .max()
            .unwrap_or(0))
    }

    async fn insert_batch(&self, tickets: &[NewTicket]) -> Result<Vec<Ticket>> {
        if tickets.is_empty() {
            return Err(CoreError::Validation("empty ticket batch".to_string()));
        }

        let created_at = Utc::now();
        let mut store = self.guard()?;

        // Validate the whole batch before touching the map so a collision
        // leaves no partial rows behind.
        for draft in tickets {
            let collision = store.values().any(|t| {
                t.event_id == draft.event_id && t.ticket_number == draft.ticket_number
            });
            if collision {
                return Err(CoreError::Conflict(format!(
                    "ticket number {} already allocated for event {}",
                    draft.ticket_number, draft.event_id
                )));
            }
        }

        let mut created = Vec::with_capacity(tickets.len());
        for draft in tickets {
            let ticket = Ticket {
                ticket_id: draft.ticket_id,
                event_id: draft.event_id,
                ticket_number: draft.ticket_number,
                total_tickets_in_group: draft.total_tickets_in_group,
                ticket_status: TicketStatus::Valid,
                nft_mint_status: MintStatus::Pending,
                nft_token_id: None,
                nft_metadata: draft.nft_metadata.clone(),
                created_at,
            };
            store.insert(ticket.ticket_id, ticket.clone());
            created.push(ticket);
        }

        Ok(created)
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .guard()?
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.ticket_number);
        Ok(tickets)
    }

    async fn status_counts(&self, event_id: EventId) -> Result<TicketStatusCounts> {
        let mut counts = TicketStatusCounts::default();
        for ticket in self.guard()?.values().filter(|t| t.event_id == event_id) {
            counts.total += 1;
            match ticket.nft_mint_status {
                MintStatus::Minted | MintStatus::Transferred => counts.minted += 1,
                MintStatus::Pending => counts.pending += 1,
                MintStatus::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }

    async fn mark_minted(&self, outcomes: &[(TicketId, U256)]) -> Result<()> {
        let mut store = self.guard()?;

        for (ticket_id, _) in outcomes {
            if !store.contains_key(ticket_id) {
                return Err(CoreError::not_found("Ticket", ticket_id));
            }
        }

        for (ticket_id, token_id) in outcomes {
            if let Some(ticket) = store.get_mut(ticket_id) {
                ticket.nft_mint_status = MintStatus::Minted;
                ticket.nft_token_id = Some(*token_id);
            }
        }

        Ok(())
    }

    async fn mark_failed(&self, ticket_ids: &[TicketId]) -> Result<()> {
        let mut store = self.guard()?;

        for ticket_id in ticket_ids {
            if let Some(ticket) = store.get_mut(ticket_id) {
                if ticket.nft_mint_status.is_deletable() {
                    ticket.nft_mint_status = MintStatus::Failed;
                }
            }
        }

        Ok(())
    }

    async fn delete(&self, ticket_id: TicketId) -> Result<()> {
        let mut store = self.guard()?;

        match store.get(&ticket_id) {
            None => Err(CoreError::not_found("Ticket", ticket_id)),
            Some(ticket) if !ticket.nft_mint_status.is_deletable() => {
                Err(CoreError::Conflict(format!(
                    "ticket {ticket_id} is {} and cannot be deleted",
                    ticket.nft_mint_status.as_str()
                )))
            }
            Some(_) => {
                store.remove(&ticket_id);
                Ok(())
            }
        }
    }

    async fn delete_by_event(&self, event_id: EventId) -> Result<u64> {
        let mut store = self.guard()?;
        let before = store.len();
        store.retain(|_, t| t.event_id != event_id || !t.nft_mint_status.is_deletable());
        Ok((before - store.len()) as u64)
    }
}
