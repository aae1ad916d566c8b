//! Handler-level API tests over in-memory state.
//!
//! Calls the Axum handlers directly with an `AppState` assembled from the
//! testing doubles, covering the issuance → status → retry flow and the
//! deletion guards end to end.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use primitive_types::H160;
use std::sync::Arc;
use ticketmint_core::{EventId, EventRecord, EventRepository};
use ticketmint_issuance::{
    BlockchainMinter, IssueMintStatus, MinterConfig, MintMode, RetryCoordinator, StatusAggregator,
    TicketIssuer,
};
use ticketmint_testing::{
    InMemoryEventRepository, InMemoryMintQueue, InMemoryTicketRepository, MockMetadataStore,
    MockNftContract,
};
use ticketmint_web::handlers::{mint, tickets};
use ticketmint_web::AppState;
use uuid::Uuid;

fn build_state(mode: MintMode) -> (AppState, Arc<MockNftContract>) {
    let events = Arc::new(InMemoryEventRepository::new());
    let ticket_repo = Arc::new(InMemoryTicketRepository::new());
    let queue = Arc::new(InMemoryMintQueue::new());
    let contract = Arc::new(MockNftContract::new());
    let storage = Arc::new(MockMetadataStore::new());

    let minter = Arc::new(BlockchainMinter::new(
        Arc::clone(&events) as _,
        Arc::clone(&ticket_repo) as _,
        Arc::clone(&queue) as _,
        Arc::clone(&contract) as _,
        storage as _,
        MinterConfig::default(),
    ));
    let issuer = Arc::new(TicketIssuer::new(
        Arc::clone(&events) as _,
        Arc::clone(&ticket_repo) as _,
        Arc::clone(&queue) as _,
        Arc::clone(&minter),
        mode,
    ));
    let retry = Arc::new(RetryCoordinator::new(Arc::clone(&queue) as _));
    let status = Arc::new(StatusAggregator::new(
        Arc::clone(&ticket_repo) as _,
        Arc::clone(&queue) as _,
    ));

    (
        AppState {
            events: events as _,
            tickets: ticket_repo as _,
            issuer,
            retry,
            status,
        },
        contract,
    )
}

async fn seed_event(state: &AppState) -> Uuid {
    let event = EventRecord {
        event_id: EventId::new(),
        name: "Rust Conf".to_string(),
        nft_contract_address: Some(H160::repeat_byte(0x11)),
        admin_wallet: Some(H160::repeat_byte(0x22)),
        created_at: Utc::now(),
    };
    state.events.insert(&event).await.expect("seed event");
    *event.event_id.as_uuid()
}

fn issue_body(quantity: u32) -> tickets::IssueTicketsRequest {
    tickets::IssueTicketsRequest {
        ticket_name: "General Admission".to_string(),
        quantity,
        price: Some(25.0),
        image_url: None,
        description: None,
        ticket_type: Some("GA".to_string()),
    }
}

#[tokio::test]
async fn issue_endpoint_creates_queued_batch() {
    let (state, _) = build_state(MintMode::Queued);
    let event_id = seed_event(&state).await;

    let (status_code, Json(body)) = tickets::issue_tickets(
        Path(event_id),
        State(state.clone()),
        Json(issue_body(3)),
    )
    .await
    .expect("issue");

    assert_eq!(status_code, StatusCode::CREATED);
    assert_eq!(body.tickets_created, 3);
    assert_eq!(body.starting_ticket_number, 1);
    assert_eq!(body.mint_status, IssueMintStatus::Queued);
    assert_eq!(body.tickets.len(), 3);
    assert!(body.tickets.iter().all(|t| t.nft_token_id.is_none()));
}

#[tokio::test]
async fn issue_endpoint_rejects_bad_quantity() {
    let (state, _) = build_state(MintMode::Queued);
    let event_id = seed_event(&state).await;

    let err = tickets::issue_tickets(
        Path(event_id),
        State(state),
        Json(issue_body(0)),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("VALIDATION_ERROR"));
}

#[tokio::test]
async fn issue_endpoint_404_for_unknown_event() {
    let (state, _) = build_state(MintMode::Queued);

    let err = tickets::issue_tickets(
        Path(Uuid::new_v4()),
        State(state),
        Json(issue_body(1)),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("NOT_FOUND"));
}

#[tokio::test]
async fn status_and_retry_flow() {
    let (state, contract) = build_state(MintMode::Immediate);
    let event_id = seed_event(&state).await;

    // A failing immediate mint leaves a failed job behind.
    contract.fail_with("rpc timeout");
    tickets::issue_tickets(Path(event_id), State(state.clone()), Json(issue_body(2)))
        .await
        .unwrap_err();

    let Json(summary) = mint::mint_status(Path(event_id), State(state.clone()))
        .await
        .expect("status");
    assert_eq!(summary.total_tickets, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.queue_jobs.len(), 1);
    assert_eq!(summary.queue_jobs[0].status, "failed");
    assert_eq!(
        summary.queue_jobs[0].error_message.as_deref(),
        Some("rpc timeout")
    );

    let Json(retried) = mint::retry_mint(Path(event_id), State(state.clone()))
        .await
        .expect("retry");
    assert_eq!(retried.reset_count, 1);

    // Idempotent on a second call.
    let Json(retried) = mint::retry_mint(Path(event_id), State(state))
        .await
        .expect("retry again");
    assert_eq!(retried.reset_count, 0);
}

#[tokio::test]
async fn delete_endpoints_respect_mint_guard() {
    let (state, _) = build_state(MintMode::Immediate);
    let event_id = seed_event(&state).await;

    let (_, Json(body)) = tickets::issue_tickets(
        Path(event_id),
        State(state.clone()),
        Json(issue_body(2)),
    )
    .await
    .expect("issue minted batch");

    // Minted tickets refuse deletion.
    let err = tickets::delete_ticket(Path(body.tickets[0].ticket_id), State(state.clone()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("CONFLICT"));

    let Json(bulk) = tickets::delete_event_tickets(Path(event_id), State(state.clone()))
        .await
        .expect("bulk delete");
    assert_eq!(bulk.deleted, 0);

    // A fresh queued batch deletes cleanly.
    let (queued_state, _) = build_state(MintMode::Queued);
    let queued_event = seed_event(&queued_state).await;
    let (_, Json(queued)) = tickets::issue_tickets(
        Path(queued_event),
        State(queued_state.clone()),
        Json(issue_body(2)),
    )
    .await
    .expect("issue queued batch");

    let code = tickets::delete_ticket(
        Path(queued.tickets[0].ticket_id),
        State(queued_state.clone()),
    )
    .await
    .expect("delete pending ticket");
    assert_eq!(code, StatusCode::NO_CONTENT);

    let Json(bulk) = tickets::delete_event_tickets(Path(queued_event), State(queued_state))
        .await
        .expect("bulk delete pending");
    assert_eq!(bulk.deleted, 1);
}
