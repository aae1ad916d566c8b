//! In-memory mint job queue with the full lifecycle semantics.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use ticketmint_core::{
    CoreError, EventId, JobId, JobStatus, MintJob, MintQueue, Result, TicketId,
};

/// In-memory [`MintQueue`] for tests.
#[derive(Clone, Default)]
pub struct InMemoryMintQueue {
    jobs: Arc<Mutex<HashMap<JobId, MintJob>>>,
}

impl InMemoryMintQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<JobId, MintJob>>> {
        self.jobs
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))
    }

    /// Backdate a job's claim time, for stale-reclaim tests.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job does not exist.
    pub fn backdate_claim(&self, job_id: JobId, age: Duration) -> Result<()> {
        let mut jobs = self.guard()?;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))?;
        job.claimed_at = Some(Utc::now() - age);
        Ok(())
    }
}

#[async_trait]
impl MintQueue for InMemoryMintQueue {
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

        self.guard()?.insert(job.job_id, job.clone());
        Ok(job)
    }

    async fn get(&self, job_id: JobId) -> Result<MintJob> {
        self.guard()?
            .get(&job_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<MintJob>> {
        let mut jobs: Vec<MintJob> = self
            .guard()?
            .values()
            .filter(|j| j.event_id == event_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<MintJob>> {
        let mut jobs: Vec<MintJob> = self
            .guard()?
            .values()
            .filter(|j| j.status == JobStatus::Pending)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn mark_processing(&self, job_id: JobId) -> Result<MintJob> {
        let mut jobs = self.guard()?;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))?;

        if job.status != JobStatus::Pending {
            return Err(CoreError::Conflict(format!(
                "job {job_id} is {} and cannot be claimed",
                job.status.as_str()
            )));
        }

        job.status = JobStatus::Processing;
        job.claimed_at = Some(Utc::now());
        job.retry_count += 1;
        Ok(job.clone())
    }

    async fn mark_minted(&self, job_id: JobId, token_ids: &[U256]) -> Result<()> {
        let mut jobs = self.guard()?;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))?;

        if token_ids.len() != job.ticket_refs.len() {
            return Err(CoreError::Validation(format!(
                "token count {} does not match job's {} tickets",
                token_ids.len(),
                job.ticket_refs.len()
            )));
        }
        if job.status != JobStatus::Processing {
            return Err(CoreError::Conflict(format!(
                "job {job_id} is not processing"
            )));
        }

        job.status = JobStatus::Minted;
        job.error_message = None;
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_failed(&self, job_id: JobId, error_message: &str) -> Result<()> {
        let mut jobs = self.guard()?;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("MintJob", job_id))?;

        if job.status != JobStatus::Processing {
            return Err(CoreError::Conflict(format!(
                "job {job_id} is not processing"
            )));
        }

        job.status = JobStatus::Failed;
        job.error_message = Some(error_message.to_string());
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn reset_failed(&self, event_id: EventId) -> Result<u64> {
        let mut jobs = self.guard()?;
        let mut reset = 0;

        for job in jobs.values_mut() {
            if job.event_id == event_id && job.status == JobStatus::Failed {
                job.status = JobStatus::Pending;
                job.retry_count = 0;
                job.error_message = None;
                job.claimed_at = None;
                job.processed_at = None;
                reset += 1;
            }
        }

        Ok(reset)
    }

    async fn reclaim_stale(&self, older_than: Duration) -> Result<Vec<MintJob>> {
        let cutoff = Utc::now() - older_than;
        let mut jobs = self.guard()?;
        let mut reclaimed = Vec::new();

        for job in jobs.values_mut() {
            let stale = job.status == JobStatus::Processing
                && job.claimed_at.is_some_and(|at| at < cutoff);
            if stale {
                job.status = JobStatus::Failed;
                job.error_message = Some("processing timed out".to_string());
                job.processed_at = Some(Utc::now());
                reclaimed.push(job.clone());
            }
        }

        Ok(reclaimed)
    }
}
