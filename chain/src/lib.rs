//! # ticketmint-chain
//!
//! Production implementations of the ticketmint chain seams:
//!
//! - [`TicketNftContract`]: submits `batchMint`/`mint` transactions over
//!   Ethereum JSON-RPC and blocks until the chain confirms or reverts.
//! - [`IpfsMetadataStore`]: uploads NFT metadata documents to
//!   content-addressed storage and returns `ipfs://` URIs.
//!
//! The node (or signer proxy) manages the sending account; this crate
//! never touches private keys.

pub mod abi;
pub mod contract;
pub mod error;
pub mod rpc;
pub mod storage;

pub use contract::{ContractConfig, TicketNftContract};
pub use error::ChainError;
pub use rpc::JsonRpcClient;
pub use storage::IpfsMetadataStore;
