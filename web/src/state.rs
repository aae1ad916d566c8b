//! Application state for the HTTP server.
//!
//! All shared resources the handlers need, injected explicitly so tests
//! can assemble the same state over in-memory doubles.

use std::sync::Arc;
use ticketmint_core::{EventRepository, TicketRepository};
use ticketmint_issuance::{RetryCoordinator, StatusAggregator, TicketIssuer};

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Event read model.
    pub events: Arc<dyn EventRepository>,
    /// Ticket persistence, used directly by the delete endpoints.
    pub tickets: Arc<dyn TicketRepository>,
    /// Issuance service.
    pub issuer: Arc<TicketIssuer>,
    /// Failed-job retry service.
    pub retry: Arc<RetryCoordinator>,
    /// Mint status rollup.
    pub status: Arc<StatusAggregator>,
}
