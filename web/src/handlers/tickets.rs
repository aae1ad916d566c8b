//! Ticket issuance and deletion endpoints.
//!
//! - POST /api/events/:event_id/tickets: issue a batch
//! - DELETE /api/tickets/:ticket_id: delete one ticket (mint-status guarded)
//! - DELETE /api/events/:event_id/tickets: delete an event's unminted tickets

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketmint_core::{EventId, Ticket, TicketId};
use ticketmint_issuance::{IssueMintStatus, IssueRequest};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for issuing tickets.
#[derive(Debug, Deserialize)]
pub struct IssueTicketsRequest {
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

/// One ticket in an API response.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    /// Ticket identifier.
    pub ticket_id: Uuid,
    /// Sequential number within the event.
    pub ticket_number: i64,
    /// Mint lifecycle state.
    pub nft_mint_status: String,
    /// Token id as a decimal string; absent until minted.
    pub nft_token_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: *ticket.ticket_id.as_uuid(),
            ticket_number: ticket.ticket_number,
            nft_mint_status: ticket.nft_mint_status.as_str().to_string(),
            nft_token_id: ticket.nft_token_id.map(|id| id.to_string()),
            created_at: ticket.created_at,
        }
    }
}

/// Response body after issuing tickets.
#[derive(Debug, Serialize)]
pub struct IssueTicketsResponse {
    /// Number of tickets created.
    pub tickets_created: usize,
    /// First allocated ticket number.
    pub starting_ticket_number: i64,
    /// The created tickets.
    pub tickets: Vec<TicketResponse>,
    /// `"minted"` when the batch minted within the request, `"queued"`
    /// when a job awaits the worker.
    pub mint_status: IssueMintStatus,
}

/// Response body after bulk deletion.
#[derive(Debug, Serialize)]
pub struct DeleteTicketsResponse {
    /// Number of tickets removed.
    pub deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Issue a batch of tickets for an event.
///
/// Numbering continues from the event's highest existing ticket; the
/// batch either fully persists or not at all.
///
/// # Errors
///
/// Returns 422 for invalid input or an event without minting
/// configuration, 404 for a missing event, 502 when an immediate-mode
/// mint fails.
pub async fn issue_tickets(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<IssueTicketsRequest>,
) -> Result<(StatusCode, Json<IssueTicketsResponse>), AppError> {
    let outcome = state
        .issuer
        .issue(IssueRequest {
            event_id: EventId::from_uuid(event_id),
            ticket_name: request.ticket_name,
            quantity: request.quantity,
            price: request.price,
            image_url: request.image_url,
            description: request.description,
            ticket_type: request.ticket_type,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueTicketsResponse {
            tickets_created: outcome.tickets.len(),
            starting_ticket_number: outcome.starting_number,
            tickets: outcome.tickets.iter().map(TicketResponse::from).collect(),
            mint_status: outcome.mint_status,
        }),
    ))
}

/// Delete a single ticket.
///
/// # Errors
///
/// Returns 409 when the ticket is minted or transferred, 404 when it does
/// not exist.
pub async fn delete_ticket(
    Path(ticket_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .tickets
        .delete(TicketId::from_uuid(ticket_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every still-unminted ticket of an event.
///
/// Minted and transferred tickets are left untouched; the response counts
/// what was actually removed.
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn delete_event_tickets(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<DeleteTicketsResponse>, AppError> {
    let deleted = state
        .tickets
        .delete_by_event(EventId::from_uuid(event_id))
        .await?;
    Ok(Json(DeleteTicketsResponse { deleted }))
}
