//! # ticketmint-testing
//!
//! In-memory implementations of the ticketmint repository and chain traits
//! for exercising the pipeline at memory speed: no database, no node, no
//! network. The doubles keep the production semantics the services depend
//! on (atomic batches, CAS claiming, deletion guards) so integration tests
//! over them are meaningful.

pub mod mocks;

pub use mocks::{
    InMemoryEventRepository, InMemoryMintQueue, InMemoryTicketRepository, MintCall,
    MockMetadataStore, MockNftContract,
};
