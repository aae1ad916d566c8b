//! Mint status and retry endpoints.
//!
//! - GET /api/events/:event_id/mint-status: per-event rollup
//! - POST /api/events/:event_id/mint-retry: reset failed jobs

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ticketmint_core::{EventId, MintJob};
use uuid::Uuid;

/// One queue job in the status response.
#[derive(Debug, Serialize)]
pub struct QueueJobResponse {
    /// Job identifier.
    pub job_id: Uuid,
    /// Lifecycle state.
    pub status: String,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job reached a terminal state, if it has.
    pub processed_at: Option<DateTime<Utc>>,
    /// Failure message, if the job failed.
    pub error_message: Option<String>,
}

impl From<&MintJob> for QueueJobResponse {
    fn from(job: &MintJob) -> Self {
        Self {
            job_id: *job.job_id.as_uuid(),
            status: job.status.as_str().to_string(),
            created_at: job.created_at,
            processed_at: job.processed_at,
            error_message: job.error_message.clone(),
        }
    }
}

/// Per-event mint status rollup.
#[derive(Debug, Serialize)]
pub struct MintStatusResponse {
    /// Total tickets issued for the event.
    pub total_tickets: u64,
    /// Tickets with a confirmed token.
    pub minted: u64,
    /// Tickets awaiting a mint attempt.
    pub pending: u64,
    /// Tickets whose last attempt failed.
    pub failed: u64,
    /// Queue history, newest first.
    pub queue_jobs: Vec<QueueJobResponse>,
}

/// Response body for a retry request.
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    /// Number of failed jobs reset to pending.
    pub reset_count: u64,
}

/// Per-event mint status summary.
///
/// Read-only; an event with no tickets or jobs yields zero counts and an
/// empty job list rather than an error.
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn mint_status(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<MintStatusResponse>, AppError> {
    let summary = state
        .status
        .summary(EventId::from_uuid(event_id))
        .await?;

    Ok(Json(MintStatusResponse {
        total_tickets: summary.total_tickets,
        minted: summary.minted,
        pending: summary.pending,
        failed: summary.failed,
        queue_jobs: summary.queue_jobs.iter().map(QueueJobResponse::from).collect(),
    }))
}

/// Reset the event's failed mint jobs so the worker retries them.
///
/// Idempotent: with nothing failed, `reset_count` is 0.
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn retry_mint(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RetryResponse>, AppError> {
    let reset_count = state.retry.retry(EventId::from_uuid(event_id)).await?;
    Ok(Json(RetryResponse { reset_count }))
}
