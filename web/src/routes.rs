//! Router configuration.

use crate::handlers::health::{health_check, readiness_check};
use crate::handlers::{mint, tickets};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Build the complete Axum router.
///
/// Health checks sit at the root; everything else lives under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Issuance and deletion
        .route("/events/:event_id/tickets", post(tickets::issue_tickets))
        .route(
            "/events/:event_id/tickets",
            delete(tickets::delete_event_tickets),
        )
        .route("/tickets/:ticket_id", delete(tickets::delete_ticket))
        // Mint pipeline
        .route("/events/:event_id/mint-status", get(mint::mint_status))
        .route("/events/:event_id/mint-retry", post(mint::retry_mint));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .with_state(state)
}
