//! In-memory doubles for every ticketmint trait seam.

pub mod chain;
pub mod events;
pub mod mint_queue;
pub mod tickets;

pub use chain::{MintCall, MockMetadataStore, MockNftContract};
pub use events::InMemoryEventRepository;
pub use mint_queue::InMemoryMintQueue;
pub use tickets::InMemoryTicketRepository;
