//! Traits over the blockchain and content-addressed storage collaborators.
//!
//! The minter only sees these seams; the production implementations live in
//! the chain crate and tests substitute scriptable doubles.

use crate::error::Result;
use crate::metadata::NftMetadata;
use async_trait::async_trait;
use primitive_types::{H160, H256, U256};

/// Outcome of a confirmed mint transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintReceipt {
    /// Hash of the confirmed transaction.
    pub transaction_hash: H256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Token ids actually minted, in submission order.
    pub token_ids: Vec<U256>,
}

/// The ticket NFT contract surface consumed by the minter.
///
/// Both calls block until the transaction is confirmed or reverts; a
/// broadcast transaction cannot be cancelled, so implementations wait for
/// chain-level resolution within their configured timeout.
#[async_trait]
pub trait NftContract: Send + Sync {
    /// Mint a batch of tokens in one transaction. `token_ids` and `uris`
    /// pair positionally; the receipt echoes the ids in the same order.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` on RPC failure, revert, or confirmation
    /// timeout. The batch is all-or-nothing at the chain level.
    async fn batch_mint(
        &self,
        contract: H160,
        recipient: H160,
        token_ids: &[U256],
        uris: &[String],
    ) -> Result<MintReceipt>;

    /// Mint a single token.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` on RPC failure, revert, or confirmation
    /// timeout.
    async fn mint(
        &self,
        contract: H160,
        recipient: H160,
        token_id: U256,
        uri: String,
    ) -> Result<MintReceipt>;
}

/// Content-addressed storage for metadata documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upload a metadata document, returning its URI. Uploads are
    /// idempotent by content when the backing store is content-addressed.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` on upload failure.
    async fn upload(&self, document: &NftMetadata) -> Result<String>;
}
