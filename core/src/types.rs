//! Domain types for the ticketmint platform.
//!
//! Value objects and entities shared by the issuance pipeline, the queue,
//! and the persistence layer: identifiers, tickets, mint jobs, and the
//! per-event minting configuration.

use crate::metadata::NftMetadata;
use chrono::{DateTime, Utc};
use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a mint job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random `JobId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `JobId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Status enums
// ============================================================================

/// Validity status of a ticket, independent of its mint state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Ticket is valid for entry.
    Valid,
    /// Ticket has been revoked by an organizer.
    Revoked,
}

impl TicketStatus {
    /// Convert status to its database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
        }
    }

    /// Parse status from its database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, crate::error::CoreError> {
        match s {
            "valid" => Ok(Self::Valid),
            "revoked" => Ok(Self::Revoked),
            _ => Err(crate::error::CoreError::Persistence(format!(
                "invalid ticket status: {s}"
            ))),
        }
    }
}

/// On-chain lifecycle state of a ticket's NFT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintStatus {
    /// Not yet submitted to the chain.
    Pending,
    /// Confirmed on chain; the ticket record is now immutable.
    Minted,
    /// A mint attempt failed; eligible for operator retry.
    Failed,
    /// Minted and subsequently transferred to another wallet.
    Transferred,
}

impl MintStatus {
    /// Convert status to its database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Minted => "minted",
            Self::Failed => "failed",
            Self::Transferred => "transferred",
        }
    }

    /// Parse status from its database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, crate::error::CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "minted" => Ok(Self::Minted),
            "failed" => Ok(Self::Failed),
            "transferred" => Ok(Self::Transferred),
            _ => Err(crate::error::CoreError::Persistence(format!(
                "invalid mint status: {s}"
            ))),
        }
    }

    /// Whether a ticket in this state may still be deleted.
    ///
    /// Once a token exists on chain (`Minted` or `Transferred`) the record
    /// is immutable and deletion is rejected.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

/// Lifecycle state of a queued mint job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker.
    Pending,
    /// Claimed; exactly one worker may hold this state per job.
    Processing,
    /// Batch transaction confirmed; terminal unless reset.
    Minted,
    /// Mint attempt failed; eligible for `reset_failed`.
    Failed,
}

impl JobStatus {
    /// Convert status to its database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Minted => "minted",
            Self::Failed => "failed",
        }
    }

    /// Parse status from its database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, crate::error::CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "minted" => Ok(Self::Minted),
            "failed" => Ok(Self::Failed),
            _ => Err(crate::error::CoreError::Persistence(format!(
                "invalid job status: {s}"
            ))),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A single issued ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier.
    pub ticket_id: TicketId,
    /// Event this ticket belongs to.
    pub event_id: EventId,
    /// Sequential number, unique within the event.
    pub ticket_number: i64,
    /// Size of the issuance batch this ticket was created in.
    pub total_tickets_in_group: i64,
    /// Validity status.
    pub ticket_status: TicketStatus,
    /// On-chain mint state.
    pub nft_mint_status: MintStatus,
    /// Token id on the event's contract; `None` until minted.
    pub nft_token_id: Option<U256>,
    /// The NFT metadata document built at issuance time.
    pub nft_metadata: NftMetadata,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A draft ticket prior to persistence.
///
/// Produced by the issuer once numbering is decided; the repository turns
/// the whole batch into rows in a single transaction.
#[derive(Clone, Debug)]
pub struct NewTicket {
    /// Pre-allocated ticket identifier.
    pub ticket_id: TicketId,
    /// Event the ticket belongs to.
    pub event_id: EventId,
    /// Allocated sequential number.
    pub ticket_number: i64,
    /// Size of the issuance batch.
    pub total_tickets_in_group: i64,
    /// Metadata document for the future NFT.
    pub nft_metadata: NftMetadata,
}

/// A queued unit of work binding a set of tickets to one batch mint attempt.
///
/// `ticket_refs` ordering is fixed at creation: position `i` corresponds to
/// the `i`-th metadata URI uploaded and the `i`-th token id returned by the
/// chain. Nothing may re-sort it between enqueue and processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintJob {
    /// Unique job identifier.
    pub job_id: JobId,
    /// Event the batch belongs to.
    pub event_id: EventId,
    /// Ordered tickets bound to this job.
    pub ticket_refs: Vec<TicketId>,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Number of times a worker has claimed this job.
    pub retry_count: i32,
    /// Failure message; `None` unless the job is failed.
    pub error_message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When a worker last claimed the job; drives stale-claim reclaim.
    pub claimed_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state (minted or failed).
    pub processed_at: Option<DateTime<Utc>>,
}

/// Minting configuration read model for an event.
///
/// The contract address lives on the event, not on individual tickets;
/// an event missing either the contract or the admin wallet cannot issue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event identifier.
    pub event_id: EventId,
    /// Human-readable event name, used in metadata defaults.
    pub name: String,
    /// Address of the deployed ticket NFT contract.
    pub nft_contract_address: Option<H160>,
    /// Wallet that receives newly minted tokens and pays gas.
    pub admin_wallet: Option<H160>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Returns the contract and wallet when both are configured.
    #[must_use]
    pub const fn minting_config(&self) -> Option<(H160, H160)> {
        match (self.nft_contract_address, self.admin_wallet) {
            (Some(contract), Some(wallet)) => Some((contract, wallet)),
            _ => None,
        }
    }
}

/// Per-event rollup of ticket mint states plus the queue's job history.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MintSummary {
    /// Total tickets issued for the event.
    pub total_tickets: u64,
    /// Tickets with a confirmed token (minted or transferred).
    pub minted: u64,
    /// Tickets awaiting a mint attempt.
    pub pending: u64,
    /// Tickets whose last mint attempt failed.
    pub failed: u64,
    /// All queue jobs for the event, newest first.
    pub queue_jobs: Vec<MintJob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            MintStatus::Pending,
            MintStatus::Minted,
            MintStatus::Failed,
            MintStatus::Transferred,
        ] {
            assert_eq!(MintStatus::parse(status.as_str()).ok(), Some(status));
        }
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Minted,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()).ok(), Some(status));
        }
        assert!(MintStatus::parse("unknown").is_err());
        assert!(JobStatus::parse("resolved").is_err());
    }

    #[test]
    fn deletable_only_before_mint() {
        assert!(MintStatus::Pending.is_deletable());
        assert!(MintStatus::Failed.is_deletable());
        assert!(!MintStatus::Minted.is_deletable());
        assert!(!MintStatus::Transferred.is_deletable());
    }

    #[test]
    fn minting_config_requires_both_fields() {
        let mut event = EventRecord {
            event_id: EventId::new(),
            name: "Launch Party".to_string(),
            nft_contract_address: Some(H160::repeat_byte(0x11)),
            admin_wallet: None,
            created_at: Utc::now(),
        };
        assert!(event.minting_config().is_none());

        event.admin_wallet = Some(H160::repeat_byte(0x22));
        assert!(event.minting_config().is_some());
    }
}
