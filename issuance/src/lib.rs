//! # ticketmint-issuance
//!
//! The ticket issuance and NFT minting pipeline:
//!
//! - [`TicketIssuer`]: allocates per-event sequential numbers, builds
//!   metadata, and persists issuance batches atomically.
//! - [`BlockchainMinter`]: uploads metadata, submits the batch mint, and
//!   reconciles the confirmed outcome into ticket and job state.
//! - [`MintWorker`]: drains the queue with bounded concurrency and one
//!   in-flight job per event.
//! - [`RetryCoordinator`]: operator-triggered reset of failed jobs.
//! - [`StatusAggregator`]: read-only per-event mint rollup.
//!
//! Every collaborator is injected through the `ticketmint-core` traits,
//! so the whole pipeline runs against PostgreSQL and a real node in
//! production and against in-memory doubles in tests.

pub mod issuer;
pub mod minter;
pub mod retry;
pub mod status;
pub mod worker;

pub use issuer::{IssueMintStatus, IssueOutcome, IssueRequest, MintMode, TicketIssuer, MAX_QUANTITY};
pub use minter::{BlockchainMinter, MinterConfig};
pub use retry::RetryCoordinator;
pub use status::StatusAggregator;
pub use worker::{MintWorker, WorkerConfig};
