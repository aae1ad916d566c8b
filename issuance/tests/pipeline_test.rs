//! End-to-end pipeline tests over the in-memory doubles.
//!
//! Exercises issuance numbering, queue lifecycle, minting write-backs,
//! retry, deletion guards, and the worker, with no database or node required.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use primitive_types::{H160, U256};
use std::sync::Arc;
use ticketmint_core::{
    CoreError, EventId, EventRecord, EventRepository, JobStatus, MintQueue, MintStatus,
    TicketRepository,
};
use ticketmint_issuance::{
    BlockchainMinter, IssueMintStatus, IssueRequest, MintMode, MinterConfig, MintWorker,
    RetryCoordinator, StatusAggregator, TicketIssuer, WorkerConfig,
};
use ticketmint_testing::{
    InMemoryEventRepository, InMemoryMintQueue, InMemoryTicketRepository, MockMetadataStore,
    MockNftContract,
};

struct Harness {
    events: Arc<InMemoryEventRepository>,
    tickets: Arc<InMemoryTicketRepository>,
    queue: Arc<InMemoryMintQueue>,
    contract: Arc<MockNftContract>,
    storage: Arc<MockMetadataStore>,
    minter: Arc<BlockchainMinter>,
    issuer: TicketIssuer,
}

fn harness(mode: MintMode) -> Harness {
    let events = Arc::new(InMemoryEventRepository::new());
    let tickets = Arc::new(InMemoryTicketRepository::new());
    let queue = Arc::new(InMemoryMintQueue::new());
    let contract = Arc::new(MockNftContract::new());
    let storage = Arc::new(MockMetadataStore::new());

    let minter = Arc::new(BlockchainMinter::new(
        Arc::clone(&events) as _,
        Arc::clone(&tickets) as _,
        Arc::clone(&queue) as _,
        Arc::clone(&contract) as _,
        Arc::clone(&storage) as _,
        MinterConfig::default(),
    ));

    let issuer = TicketIssuer::new(
        Arc::clone(&events) as _,
        Arc::clone(&tickets) as _,
        Arc::clone(&queue) as _,
        Arc::clone(&minter),
        mode,
    );

    Harness {
        events,
        tickets,
        queue,
        contract,
        storage,
        minter,
        issuer,
    }
}

async fn seed_event(h: &Harness, name: &str) -> EventId {
    let event = EventRecord {
        event_id: EventId::new(),
        name: name.to_string(),
        nft_contract_address: Some(H160::repeat_byte(0x11)),
        admin_wallet: Some(H160::repeat_byte(0x22)),
        created_at: Utc::now(),
    };
    h.events.insert(&event).await.expect("seed event");
    event.event_id
}

fn request(event_id: EventId, quantity: u32) -> IssueRequest {
    IssueRequest {
        event_id,
        ticket_name: "General Admission".to_string(),
        quantity,
        price: None,
        image_url: None,
        description: None,
        ticket_type: None,
    }
}

#[tokio::test]
async fn fresh_event_numbers_from_one() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let outcome = h.issuer.issue(request(event_id, 5)).await.expect("issue");

    assert_eq!(outcome.starting_number, 1);
    assert_eq!(outcome.mint_status, IssueMintStatus::Queued);
    assert_eq!(outcome.tickets.len(), 5);
    for (i, ticket) in outcome.tickets.iter().enumerate() {
        assert_eq!(ticket.ticket_number, i as i64 + 1);
        assert_eq!(ticket.nft_mint_status, MintStatus::Pending);
        assert_eq!(ticket.total_tickets_in_group, 5);
        assert!(ticket.nft_token_id.is_none());
    }
}

#[tokio::test]
async fn second_batch_continues_numbering() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    h.issuer.issue(request(event_id, 3)).await.expect("first");
    let outcome = h.issuer.issue(request(event_id, 2)).await.expect("second");

    assert_eq!(outcome.starting_number, 4);
    let numbers: Vec<i64> = h
        .tickets
        .list_by_event(event_id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.ticket_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn concurrent_issuance_never_collides() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let issuer = Arc::new(h.issuer);

    let a = {
        let issuer = Arc::clone(&issuer);
        tokio::spawn(async move { issuer.issue(request(event_id, 50)).await })
    };
    let b = {
        let issuer = Arc::clone(&issuer);
        tokio::spawn(async move { issuer.issue(request(event_id, 50)).await })
    };
    a.await.unwrap().expect("first batch");
    b.await.unwrap().expect("second batch");

    let mut numbers: Vec<i64> = h
        .tickets
        .list_by_event(event_id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.ticket_number)
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=100).collect::<Vec<i64>>());
}

#[tokio::test]
async fn issuance_rejects_unconfigured_event() {
    let h = harness(MintMode::Queued);
    let event = EventRecord {
        event_id: EventId::new(),
        name: "No Chain".to_string(),
        nft_contract_address: None,
        admin_wallet: Some(H160::repeat_byte(0x22)),
        created_at: Utc::now(),
    };
    h.events.insert(&event).await.unwrap();

    let err = h.issuer.issue(request(event.event_id, 1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(h.tickets.list_by_event(event.event_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn issuance_rejects_missing_event() {
    let h = harness(MintMode::Queued);
    let err = h.issuer.issue(request(EventId::new(), 1)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[tokio::test]
async fn queued_mode_leaves_job_pending() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();

    let job = h.queue.get(outcome.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.ticket_refs.len(), 3);
    assert!(h.contract.calls().is_empty());
}

#[tokio::test]
async fn immediate_mode_mints_within_request() {
    let h = harness(MintMode::Immediate);
    let event_id = seed_event(&h, "Rust Conf").await;

    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();

    assert_eq!(outcome.mint_status, IssueMintStatus::Minted);
    for (i, ticket) in outcome.tickets.iter().enumerate() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Minted);
        assert_eq!(ticket.nft_token_id, Some(U256::from(i as u64 + 1)));
    }
    let job = h.queue.get(outcome.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Minted);
}

#[tokio::test]
async fn immediate_mode_failure_still_records_job() {
    let h = harness(MintMode::Immediate);
    let event_id = seed_event(&h, "Rust Conf").await;
    h.contract.fail_with("rpc timeout");

    let err = h.issuer.issue(request(event_id, 2)).await.unwrap_err();
    assert!(matches!(err, CoreError::ExternalService(_)));

    // The tickets and the failed job survive for operator retry.
    let jobs = h.queue.list_by_event(event_id).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert_eq!(jobs[0].error_message.as_deref(), Some("rpc timeout"));
    for ticket in h.tickets.list_by_event(event_id).await.unwrap() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Failed);
    }
}

#[tokio::test]
async fn minter_uploads_in_ticket_order() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let outcome = h.issuer.issue(request(event_id, 4)).await.unwrap();
    h.minter.process(outcome.job_id).await.expect("mint");

    let calls = h.contract.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].token_ids,
        vec![U256::from(1), U256::from(2), U256::from(3), U256::from(4)]
    );
    // URI i belongs to ticket i: the mock derives URIs from the document
    // name, which embeds the ticket number.
    for (i, uri) in calls[0].uris.iter().enumerate() {
        assert!(
            uri.ends_with(&format!("#{}", i + 1)),
            "uri {uri} out of order at index {i}"
        );
    }
    assert_eq!(h.storage.uploads().len(), 4);
}

#[tokio::test]
async fn single_ticket_uses_single_mint() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let outcome = h.issuer.issue(request(event_id, 1)).await.unwrap();
    h.minter.process(outcome.job_id).await.expect("mint");

    let calls = h.contract.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token_ids, vec![U256::from(1)]);
}

#[tokio::test]
async fn upload_failure_fails_whole_job() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    h.storage.fail_with("pinning service unavailable");

    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();
    let err = h.minter.process(outcome.job_id).await.unwrap_err();
    assert!(matches!(err, CoreError::ExternalService(_)));

    let job = h.queue.get(outcome.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(h.contract.calls().is_empty());
    for ticket in h.tickets.list_by_event(event_id).await.unwrap() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Failed);
    }
}

#[tokio::test]
async fn double_claim_is_rejected() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let outcome = h.issuer.issue(request(event_id, 2)).await.unwrap();

    h.queue.mark_processing(outcome.job_id).await.expect("first claim");
    let err = h.queue.mark_processing(outcome.job_id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let job = h.queue.get(outcome.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.retry_count, 1);
}

#[tokio::test]
async fn reset_failed_touches_only_failed_jobs() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let pending = h.issuer.issue(request(event_id, 1)).await.unwrap();
    let processing = h.issuer.issue(request(event_id, 1)).await.unwrap();
    let failed = h.issuer.issue(request(event_id, 1)).await.unwrap();
    let minted = h.issuer.issue(request(event_id, 1)).await.unwrap();

    h.queue.mark_processing(processing.job_id).await.unwrap();
    h.queue.mark_processing(failed.job_id).await.unwrap();
    h.queue.mark_failed(failed.job_id, "revert").await.unwrap();
    h.queue.mark_processing(minted.job_id).await.unwrap();
    h.queue
        .mark_minted(minted.job_id, &[U256::from(4)])
        .await
        .unwrap();

    let before_pending = h.queue.get(pending.job_id).await.unwrap();
    let before_processing = h.queue.get(processing.job_id).await.unwrap();
    let before_minted = h.queue.get(minted.job_id).await.unwrap();

    let coordinator = RetryCoordinator::new(Arc::clone(&h.queue) as _);
    assert_eq!(coordinator.retry(event_id).await.unwrap(), 1);

    let reset = h.queue.get(failed.job_id).await.unwrap();
    assert_eq!(reset.status, JobStatus::Pending);
    assert_eq!(reset.retry_count, 0);
    assert!(reset.error_message.is_none());

    assert_eq!(h.queue.get(pending.job_id).await.unwrap(), before_pending);
    assert_eq!(
        h.queue.get(processing.job_id).await.unwrap(),
        before_processing
    );
    assert_eq!(h.queue.get(minted.job_id).await.unwrap(), before_minted);

    // Idempotent: a second call finds nothing to reset.
    assert_eq!(coordinator.retry(event_id).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_then_retried_job_mints() {
    // Full recovery cycle on one event: fail, reset, mint.
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "E1").await;

    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();
    let numbers: Vec<i64> = outcome.tickets.iter().map(|t| t.ticket_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    h.contract.fail_with("rpc timeout");
    h.minter.process(outcome.job_id).await.unwrap_err();
    for ticket in h.tickets.list_by_event(event_id).await.unwrap() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Failed);
    }

    let coordinator = RetryCoordinator::new(Arc::clone(&h.queue) as _);
    assert_eq!(coordinator.retry(event_id).await.unwrap(), 1);
    assert_eq!(
        h.queue.get(outcome.job_id).await.unwrap().status,
        JobStatus::Pending
    );
    // Retry itself leaves ticket statuses alone.
    for ticket in h.tickets.list_by_event(event_id).await.unwrap() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Failed);
    }

    h.contract.succeed();
    let token_ids = h.minter.process(outcome.job_id).await.expect("retry mint");
    assert_eq!(
        token_ids,
        vec![U256::from(1), U256::from(2), U256::from(3)]
    );
    for (i, ticket) in h
        .tickets
        .list_by_event(event_id)
        .await
        .unwrap()
        .iter()
        .enumerate()
    {
        assert_eq!(ticket.nft_mint_status, MintStatus::Minted);
        assert_eq!(ticket.nft_token_id, Some(U256::from(i as u64 + 1)));
    }
}

#[tokio::test]
async fn minted_tickets_cannot_be_deleted() {
    let h = harness(MintMode::Immediate);
    let event_id = seed_event(&h, "Rust Conf").await;
    let outcome = h.issuer.issue(request(event_id, 2)).await.unwrap();

    let ticket_id = outcome.tickets[0].ticket_id;
    let err = h.tickets.delete(ticket_id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(h.tickets.get(ticket_id).await.is_ok());

    // Bulk delete skips minted rows entirely.
    assert_eq!(h.tickets.delete_by_event(event_id).await.unwrap(), 0);
    assert_eq!(h.tickets.list_by_event(event_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn pending_tickets_delete_cleanly() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();

    h.tickets.delete(outcome.tickets[0].ticket_id).await.expect("delete");
    assert_eq!(h.tickets.delete_by_event(event_id).await.unwrap(), 2);
    assert!(h.tickets.list_by_event(event_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn status_summary_rolls_up_counts_and_jobs() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let aggregator = StatusAggregator::new(Arc::clone(&h.tickets) as _, Arc::clone(&h.queue) as _);

    // Absence of data is not an error.
    let empty = aggregator.summary(event_id).await.unwrap();
    assert_eq!(empty.total_tickets, 0);
    assert!(empty.queue_jobs.is_empty());

    let first = h.issuer.issue(request(event_id, 3)).await.unwrap();
    h.minter.process(first.job_id).await.unwrap();
    h.issuer.issue(request(event_id, 2)).await.unwrap();

    let summary = aggregator.summary(event_id).await.unwrap();
    assert_eq!(summary.total_tickets, 5);
    assert_eq!(summary.minted, 3);
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.queue_jobs.len(), 2);
    // Newest first.
    assert!(summary.queue_jobs[0].created_at >= summary.queue_jobs[1].created_at);
}

fn worker_over(h: &Harness, config: WorkerConfig) -> MintWorker {
    MintWorker::new(
        Arc::clone(&h.queue) as _,
        Arc::clone(&h.tickets) as _,
        Arc::clone(&h.minter),
        config,
    )
}

#[tokio::test]
async fn worker_drains_pending_jobs() {
    let h = harness(MintMode::Queued);
    let event_a = seed_event(&h, "A").await;
    let event_b = seed_event(&h, "B").await;

    let a = h.issuer.issue(request(event_a, 2)).await.unwrap();
    let b = h.issuer.issue(request(event_b, 3)).await.unwrap();

    let worker = worker_over(&h, WorkerConfig::default());
    worker.drain_once().await;

    assert_eq!(h.queue.get(a.job_id).await.unwrap().status, JobStatus::Minted);
    assert_eq!(h.queue.get(b.job_id).await.unwrap().status, JobStatus::Minted);
}

#[tokio::test]
async fn worker_runs_one_job_per_event_per_cycle() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;

    let first = h.issuer.issue(request(event_id, 1)).await.unwrap();
    let second = h.issuer.issue(request(event_id, 1)).await.unwrap();

    let worker = worker_over(&h, WorkerConfig::default());
    worker.drain_once().await;

    // Oldest job minted; the same event's second job waits a cycle.
    assert_eq!(
        h.queue.get(first.job_id).await.unwrap().status,
        JobStatus::Minted
    );
    assert_eq!(
        h.queue.get(second.job_id).await.unwrap().status,
        JobStatus::Pending
    );

    worker.drain_once().await;
    assert_eq!(
        h.queue.get(second.job_id).await.unwrap().status,
        JobStatus::Minted
    );
}

#[tokio::test]
async fn stale_processing_jobs_are_reclaimed() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let outcome = h.issuer.issue(request(event_id, 2)).await.unwrap();

    h.queue.mark_processing(outcome.job_id).await.unwrap();
    h.queue
        .backdate_claim(outcome.job_id, Duration::minutes(30))
        .unwrap();

    let worker = worker_over(&h, WorkerConfig::default());
    worker.sweep_stale().await;

    let job = h.queue.get(outcome.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("processing timed out"));
    for ticket in h.tickets.list_by_event(event_id).await.unwrap() {
        assert_eq!(ticket.nft_mint_status, MintStatus::Failed);
    }

    // The reclaimed job is now recoverable through the normal retry path.
    let coordinator = RetryCoordinator::new(Arc::clone(&h.queue) as _);
    assert_eq!(coordinator.retry(event_id).await.unwrap(), 1);
    worker.drain_once().await;
    assert_eq!(
        h.queue.get(outcome.job_id).await.unwrap().status,
        JobStatus::Minted
    );
}

#[tokio::test]
async fn mark_minted_requires_matching_token_count() {
    let h = harness(MintMode::Queued);
    let event_id = seed_event(&h, "Rust Conf").await;
    let outcome = h.issuer.issue(request(event_id, 3)).await.unwrap();

    h.queue.mark_processing(outcome.job_id).await.unwrap();
    let err = h
        .queue
        .mark_minted(outcome.job_id, &[U256::from(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(
        h.queue.get(outcome.job_id).await.unwrap().status,
        JobStatus::Processing
    );
}
