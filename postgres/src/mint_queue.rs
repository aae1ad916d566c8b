//! PostgreSQL mint job queue.
//!
//! Job claiming is a conditional UPDATE: the transition only applies when
//! the row is still in the expected state, and zero affected rows means
//! another worker won the race. The queue owns job rows only; ticket
//! write-backs belong to the minter.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use primitive_types::U256;
use sqlx::{PgPool, Row};
use ticketmint_core::{
    CoreError, EventId, JobId, JobStatus, MintJob, MintQueue, Result, TicketId,
};
use uuid::Uuid;

/// PostgreSQL-backed [`MintQueue`].
#[derive(Clone)]
pub struct PostgresMintQueue {
    pool: PgPool,
}

impl PostgresMintQueue {
    /// Create a queue over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, job_id: JobId) -> Result<Option<MintJob>> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM mint_jobs WHERE job_id = $1"
        ))
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get job", e))?;

        row.as_ref().map(row_to_job).transpose()
    }
}

const JOB_COLUMNS: &str = r"job_id, event_id, ticket_refs, status, retry_count,
       error_message, created_at, claimed_at, processed_at";

fn db_err(context: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::Persistence(format!("{context}: {e}"))
}

fn row_to_job(row: &sqlx::postgres::PgRow) -> Result<MintJob> {
    let job_id: Uuid = row.try_get("job_id").map_err(|e| db_err("job row", e))?;
    let event_id: Uuid = row.try_get("event_id").map_err(|e| db_err("job row", e))?;
    let refs: Vec<Uuid> = row
        .try_get("ticket_refs")
        .map_err(|e| db_err("job row", e))?;
    let status: String = row.try_get("status").map_err(|e| db_err("job row", e))?;

    Ok(MintJob {
        job_id: JobId::from_uuid(job_id),
        event_id: EventId::from_uuid(event_id),
        ticket_refs: refs.into_iter().map(TicketId::from_uuid).collect(),
        status: JobStatus::parse(&status)?,
        retry_count: row
            .try_get("retry_count")
            .map_err(|e| db_err("job row", e))?,
        error_message: row
            .try_get("error_message")
            .map_err(|e| db_err("job row", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| db_err("job row", e))?,
        claimed_at: row
            .try_get("claimed_at")
            .map_err(|e| db_err("job row", e))?,
        processed_at: row
            .try_get("processed_at")
            .map_err(|e| db_err("job row", e))?,
    })
}

#[async_trait]
impl MintQueue for PostgresMintQueue {
    async fn enqueue(&self, event_id: EventId, ticket_refs: Vec<TicketId>) -> Result<MintJob> {
        if ticket_refs.is_empty() {
            return Err(CoreError::Validation("empty mint job".to_string()));
        }

        let job = MintJob {
            job_id: JobId::new(),
            event_id,
            ticket_refs,
            status: JobStatus::Pending,
            retry_count: 0,
            error_message: None,
            created_at: Utc::now(),
            claimed_at: None,
            processed_at: None,
        };

        let refs: Vec<Uuid> = job.ticket_refs.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query(
            r"
            INSERT INTO mint_jobs (job_id, event_id, ticket_refs, status, retry_count, created_at)
            VALUES ($1, $2, $3, 'pending', 0, $4)
            ",
        )
        .bind(job.job_id.as_uuid())
        .bind(event_id.as_uuid())
        .bind(&refs)
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to enqueue job", e))?;

        tracing::info!(
            job_id = %job.job_id,
            event_id = %event_id,
            tickets = job.ticket_refs.len(),
            "Mint job enqueued"
        );
        metrics::counter!("mint_queue.enqueued").increment(1);

        Ok(job)
    }

    async fn get(&self, job_id: JobId) -> Result<MintJob> {
        self.fetch(job_id)
            .await?
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<MintJob>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM mint_jobs WHERE event_id = $1 ORDER BY created_at DESC"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list jobs", e))?;

        rows.iter().map(row_to_job).collect()
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<MintJob>> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM mint_jobs WHERE status = 'pending'
             ORDER BY created_at ASC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list pending jobs", e))?;

        rows.iter().map(row_to_job).collect()
    }

    async fn mark_processing(&self, job_id: JobId) -> Result<MintJob> {
        let row = sqlx::query(&format!(
            "UPDATE mint_jobs
             SET status = 'processing', claimed_at = NOW(), retry_count = retry_count + 1
             WHERE job_id = $1 AND status = 'pending'
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to claim job", e))?;

        match row {
            Some(row) => {
                metrics::counter!("mint_queue.claimed").increment(1);
                row_to_job(&row)
            }
            None => match self.fetch(job_id).await? {
                Some(job) => Err(CoreError::Conflict(format!(
                    "job {job_id} is {} and cannot be claimed",
                    job.status.as_str()
                ))),
                None => Err(CoreError::not_found("MintJob", job_id)),
            },
        }
    }

    async fn mark_minted(&self, job_id: JobId, token_ids: &[U256]) -> Result<()> {
        let job = self.get(job_id).await?;
        if token_ids.len() != job.ticket_refs.len() {
            return Err(CoreError::Validation(format!(
                "token count {} does not match job's {} tickets",
                token_ids.len(),
                job.ticket_refs.len()
            )));
        }

        let result = sqlx::query(
            r"
            UPDATE mint_jobs
            SET status = 'minted', error_message = NULL, processed_at = NOW()
            WHERE job_id = $1 AND status = 'processing'
            ",
        )
        .bind(job_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to mark job minted", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "job {job_id} is not processing"
            )));
        }

        tracing::info!(job_id = %job_id, tokens = token_ids.len(), "Mint job completed");
        metrics::counter!("mint_queue.minted").increment(1);

        Ok(())
    }

    async fn mark_failed(&self, job_id: JobId, error_message: &str) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE mint_jobs
            SET status = 'failed', error_message = $2, processed_at = NOW()
            WHERE job_id = $1 AND status = 'processing'
            ",
        )
        .bind(job_id.as_uuid())
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to mark job failed", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "job {job_id} is not processing"
            )));
        }

        tracing::warn!(job_id = %job_id, error = error_message, "Mint job failed");
        metrics::counter!("mint_queue.failed").increment(1);

        Ok(())
    }

    async fn reset_failed(&self, event_id: EventId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE mint_jobs
            SET status = 'pending', retry_count = 0, error_message = NULL,
                claimed_at = NULL, processed_at = NULL
            WHERE event_id = $1 AND status = 'failed'
            ",
        )
        .bind(event_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to reset jobs", e))?;

        let reset = result.rows_affected();
        if reset > 0 {
            tracing::info!(event_id = %event_id, reset, "Failed mint jobs reset");
            metrics::counter!("mint_queue.reset").increment(reset);
        }

        Ok(reset)
    }

    async fn reclaim_stale(&self, older_than: Duration) -> Result<Vec<MintJob>> {
        let cutoff = Utc::now() - older_than;
        let rows = sqlx::query(&format!(
            "UPDATE mint_jobs
             SET status = 'failed', error_message = 'processing timed out', processed_at = NOW()
             WHERE status = 'processing' AND claimed_at < $1
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to reclaim stale jobs", e))?;

        let jobs: Vec<MintJob> = rows.iter().map(row_to_job).collect::<Result<_>>()?;
        if !jobs.is_empty() {
            tracing::warn!(count = jobs.len(), "Stale processing jobs reclaimed");
            metrics::counter!("mint_queue.reclaimed").increment(jobs.len() as u64);
        }

        Ok(jobs)
    }
}
