//! Turns a claimed mint job into on-chain tokens.
//!
//! The job's `ticket_refs` ordering is positional truth: URI `i` is the
//! uploaded metadata of ticket `i`, and token id `i` is that ticket's
//! number. Uploads run concurrently but reassemble in order; a single
//! failure anywhere fails the whole job. The batch transaction is
//! all-or-nothing at the chain level and the records mirror that: either
//! every ticket becomes minted with its token id, or every ticket and the
//! job are marked failed.

use futures::stream::{self, StreamExt, TryStreamExt};
use primitive_types::U256;
use std::sync::Arc;
use ticketmint_core::chain::{MetadataStore, NftContract};
use ticketmint_core::{
    CoreError, EventRepository, JobId, MintJob, MintQueue, Result, Ticket, TicketId,
    TicketRepository,
};

/// Tuning for the minter.
#[derive(Clone, Debug)]
pub struct MinterConfig {
    /// Maximum concurrent metadata uploads per job.
    pub upload_concurrency: usize,
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: 4,
        }
    }
}

/// Submits batched mint transactions and reconciles the outcome into
/// ticket and job state.
pub struct BlockchainMinter {
    events: Arc<dyn EventRepository>,
    tickets: Arc<dyn TicketRepository>,
    queue: Arc<dyn MintQueue>,
    contract: Arc<dyn NftContract>,
    storage: Arc<dyn MetadataStore>,
    config: MinterConfig,
}

impl BlockchainMinter {
    /// Create a minter over the given collaborators.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventRepository>,
        tickets: Arc<dyn TicketRepository>,
        queue: Arc<dyn MintQueue>,
        contract: Arc<dyn NftContract>,
        storage: Arc<dyn MetadataStore>,
        config: MinterConfig,
    ) -> Self {
        Self {
            events,
            tickets,
            queue,
            contract,
            storage,
            config,
        }
    }

    /// Claim a pending job and mint it.
    ///
    /// On success the job becomes `Minted` and every referenced ticket
    /// carries its positional token id. On any failure (upload,
    /// submission, revert, confirmation timeout) the job becomes
    /// `Failed` and every referenced ticket is marked failed; recovery is
    /// explicit via the retry path, never an automatic resubmission.
    ///
    /// A crash after chain confirmation but before the write-back leaves
    /// the records behind the chain; that window needs an external
    /// reconciliation pass against confirmed transactions.
    ///
    /// # Errors
    ///
    /// - `Conflict` when the job is not pending (another worker holds it);
    ///   nothing is mutated.
    /// - `ExternalService` when the mint attempt failed; the failure is
    ///   already recorded on the job and tickets.
    pub async fn process(&self, job_id: JobId) -> Result<Vec<U256>> {
        let job = self.queue.mark_processing(job_id).await?;

        match self.mint_claimed(&job).await {
            Ok(token_ids) => {
                self.queue.mark_minted(job.job_id, &token_ids).await?;
                let outcomes: Vec<(TicketId, U256)> = job
                    .ticket_refs
                    .iter()
                    .copied()
                    .zip(token_ids.iter().copied())
                    .collect();
                self.tickets.mark_minted(&outcomes).await?;

                tracing::info!(
                    job_id = %job.job_id,
                    event_id = %job.event_id,
                    tokens = token_ids.len(),
                    "Mint job confirmed and recorded"
                );
                metrics::counter!("minter.jobs_minted").increment(1);

                Ok(token_ids)
            }
            Err(err) => {
                // Store the upstream message verbatim; the taxonomy prefix
                // adds nothing inside a failed-job record.
                let message = match &err {
                    CoreError::ExternalService(msg) => msg.clone(),
                    other => other.to_string(),
                };
                self.queue.mark_failed(job.job_id, &message).await?;
                self.tickets.mark_failed(&job.ticket_refs).await?;

                tracing::warn!(
                    job_id = %job.job_id,
                    event_id = %job.event_id,
                    error = %message,
                    "Mint job failed"
                );
                metrics::counter!("minter.jobs_failed").increment(1);

                Err(err)
            }
        }
    }

    async fn mint_claimed(&self, job: &MintJob) -> Result<Vec<U256>> {
        let event = self.events.get(job.event_id).await?;
        let (contract_address, wallet) = event.minting_config().ok_or_else(|| {
            CoreError::Validation(format!(
                "event {} has no minting configuration",
                job.event_id
            ))
        })?;

        // Load tickets strictly in ref order; everything downstream pairs
        // by index.
        let mut tickets: Vec<Ticket> = Vec::with_capacity(job.ticket_refs.len());
        for ticket_id in &job.ticket_refs {
            tickets.push(self.tickets.get(*ticket_id).await?);
        }

        let token_ids = tickets
            .iter()
            .map(|t| {
                u64::try_from(t.ticket_number)
                    .map(U256::from)
                    .map_err(|_| {
                        CoreError::Persistence(format!(
                            "ticket {} has invalid number {}",
                            t.ticket_id, t.ticket_number
                        ))
                    })
            })
            .collect::<Result<Vec<U256>>>()?;

        // Bounded concurrency, results reassembled in submission order.
        let upload_futures: Vec<_> = tickets
            .iter()
            .map(|ticket| {
                let storage = Arc::clone(&self.storage);
                let metadata = ticket.nft_metadata.clone();
                async move { storage.upload(&metadata).await }
            })
            .collect();
        let uris: Vec<String> = stream::iter(upload_futures)
            .buffered(self.config.upload_concurrency.max(1))
            .try_collect()
            .await?;

        let receipt = if token_ids.len() == 1 {
            self.contract
                .mint(contract_address, wallet, token_ids[0], uris[0].clone())
                .await?
        } else {
            self.contract
                .batch_mint(contract_address, wallet, &token_ids, &uris)
                .await?
        };

        if receipt.token_ids != token_ids {
            return Err(CoreError::ExternalService(format!(
                "receipt token ids diverge from submission for job {}",
                job.job_id
            )));
        }

        Ok(receipt.token_ids)
    }
}
