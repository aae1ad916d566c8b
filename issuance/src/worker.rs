//! Queue-draining worker pool.
//!
//! Drains pending mint jobs with bounded concurrency while keeping at most
//! one in-flight job per event, which preserves per-event ordering. Each
//! cycle also reclaims jobs stuck in processing past the stale bound so a
//! crashed worker cannot strand a job.

use crate::minter::BlockchainMinter;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticketmint_core::{CoreError, EventId, MintQueue, TicketRepository};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Tuning for the worker loop.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Delay between drain cycles.
    pub poll_interval: Duration,
    /// Maximum pending jobs fetched per cycle.
    pub batch_size: usize,
    /// Maximum jobs minted concurrently (across events).
    pub concurrency: usize,
    /// Age past which a processing claim counts as stale.
    pub stale_after: chrono::Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 32,
            concurrency: 4,
            stale_after: chrono::Duration::minutes(10),
        }
    }
}

/// Drains the mint queue through the [`BlockchainMinter`].
pub struct MintWorker {
    queue: Arc<dyn MintQueue>,
    tickets: Arc<dyn TicketRepository>,
    minter: Arc<BlockchainMinter>,
    config: WorkerConfig,
    limiter: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<EventId>>>,
}

impl MintWorker {
    /// Create a worker over the queue and minter.
    #[must_use]
    pub fn new(
        queue: Arc<dyn MintQueue>,
        tickets: Arc<dyn TicketRepository>,
        minter: Arc<BlockchainMinter>,
        config: WorkerConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            queue,
            tickets,
            minter,
            config,
            limiter,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run until the shutdown signal flips to `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval = ?self.config.poll_interval,
            concurrency = self.config.concurrency,
            "Mint worker started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep_stale().await;
                    self.drain_once().await;
                }
            }
        }

        tracing::info!("Mint worker stopped");
    }

    /// Reclaim jobs stuck in processing and fail their tickets so the
    /// whole set is recoverable through the normal retry path.
    pub async fn sweep_stale(&self) {
        let reclaimed = match self.queue.reclaim_stale(self.config.stale_after).await {
            Ok(jobs) => jobs,
            Err(err) => {
                tracing::warn!(error = %err, "Stale-job sweep failed");
                return;
            }
        };

        for job in reclaimed {
            if let Err(err) = self.tickets.mark_failed(&job.ticket_refs).await {
                tracing::warn!(
                    job_id = %job.job_id,
                    error = %err,
                    "Failed to mark tickets of reclaimed job"
                );
            }
        }
    }

    /// Run one drain cycle: claim and mint every currently pending job,
    /// bounded by the concurrency limit and the one-per-event rule.
    /// Waits for the cycle's jobs to finish before returning.
    pub async fn drain_once(&self) {
        let pending = match self.queue.list_pending(self.config.batch_size).await {
            Ok(jobs) => jobs,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to list pending jobs");
                return;
            }
        };

        let mut tasks = JoinSet::new();

        for job in pending {
            // One in-flight job per event; the rest of that event's jobs
            // wait for a later cycle.
            let claimed_slot = {
                match self.in_flight.lock() {
                    Ok(mut set) => set.insert(job.event_id),
                    Err(_) => false,
                }
            };
            if !claimed_slot {
                continue;
            }

            let permit = match Arc::clone(&self.limiter).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    release_slot(&self.in_flight, job.event_id);
                    break;
                }
            };

            let minter = Arc::clone(&self.minter);
            let in_flight = Arc::clone(&self.in_flight);
            tasks.spawn(async move {
                let _permit = permit;
                let result = minter.process(job.job_id).await;
                release_slot(&in_flight, job.event_id);

                match result {
                    Ok(_) => {}
                    // Lost the claim race to another worker; not an error.
                    Err(CoreError::Conflict(_)) => {
                        tracing::debug!(job_id = %job.job_id, "Job already claimed");
                    }
                    Err(err) => {
                        tracing::warn!(job_id = %job.job_id, error = %err, "Mint attempt failed");
                    }
                }
            });
        }

        while tasks.join_next().await.is_some() {}
    }
}

fn release_slot(in_flight: &Mutex<HashSet<EventId>>, event_id: EventId) {
    if let Ok(mut set) = in_flight.lock() {
        set.remove(&event_id);
    }
}
