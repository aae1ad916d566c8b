//! # ticketmint-core
//!
//! Domain types, error taxonomy, and the trait seams of the ticketmint
//! platform: tickets, mint jobs, NFT metadata, repositories, and the
//! blockchain/storage collaborators consumed by the minting pipeline.
//!
//! This crate performs no I/O. Everything here is either a value type or a
//! trait implemented elsewhere (PostgreSQL, chain clients, test doubles).

pub mod chain;
pub mod error;
pub mod metadata;
pub mod repository;
pub mod types;

pub use chain::{MetadataStore, MintReceipt, NftContract};
pub use error::{CoreError, Result};
pub use metadata::{build_ticket_metadata, NftAttribute, NftMetadata, TicketTemplate};
pub use repository::{EventRepository, MintQueue, TicketRepository, TicketStatusCounts};
pub use types::{
    EventId, EventRecord, JobId, JobStatus, MintJob, MintStatus, MintSummary, NewTicket, Ticket,
    TicketId, TicketStatus,
};
