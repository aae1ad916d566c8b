//! Ticket NFT contract binding.
//!
//! Builds calldata for the contract's mint entrypoints, submits the
//! transaction through the node, and blocks until the chain resolves it.
//! A broadcast transaction is never cancelled locally: the binding polls
//! for the receipt until the configured confirmation window elapses.

use crate::abi::{encode_call, AbiToken};
use crate::error::ChainError;
use crate::rpc::{JsonRpcClient, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use serde_json::json;
use std::time::Duration;
use ticketmint_core::chain::{MintReceipt, NftContract};
use ticketmint_core::Result;

const BATCH_MINT_SIG: &str = "batchMint(address,uint256[],string[])";
const MINT_SIG: &str = "mint(address,uint256,string)";

/// Configuration for the contract binding.
#[derive(Clone, Debug)]
pub struct ContractConfig {
    /// How long to wait for a receipt before giving up on confirmation.
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// [`NftContract`] implementation over JSON-RPC.
///
/// Transactions are sent from the recipient wallet, which must be an
/// account managed by the connected node or signer proxy.
#[derive(Clone)]
pub struct TicketNftContract {
    rpc: JsonRpcClient,
    config: ContractConfig,
}

impl TicketNftContract {
    /// Create a binding over an RPC client.
    #[must_use]
    pub fn new(rpc: JsonRpcClient, config: ContractConfig) -> Self {
        Self { rpc, config }
    }

    async fn submit_and_confirm(
        &self,
        contract: H160,
        sender: H160,
        calldata: Vec<u8>,
    ) -> std::result::Result<TransactionReceipt, ChainError> {
        let tx = TransactionRequest {
            from: sender,
            to: contract,
            data: format!("0x{}", hex::encode(calldata)),
        };

        let tx_hash: H256 = self.rpc.call("eth_sendTransaction", json!([tx])).await?;

        tracing::info!(
            tx_hash = %format!("{tx_hash:#x}"),
            contract = %format!("{contract:#x}"),
            "Mint transaction broadcast"
        );

        let receipt = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.poll_receipt(tx_hash),
        )
        .await
        .map_err(|_| ChainError::ConfirmationTimeout {
            tx_hash: format!("{tx_hash:#x}"),
            seconds: self.config.confirmation_timeout.as_secs(),
        })??;

        if receipt.succeeded() {
            Ok(receipt)
        } else {
            Err(ChainError::Reverted {
                tx_hash: format!("{tx_hash:#x}"),
            })
        }
    }

    async fn poll_receipt(
        &self,
        tx_hash: H256,
    ) -> std::result::Result<TransactionReceipt, ChainError> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .rpc
                .call_optional(
                    "eth_getTransactionReceipt",
                    json!([format!("{tx_hash:#x}")]),
                )
                .await?;

            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl NftContract for TicketNftContract {
    async fn batch_mint(
        &self,
        contract: H160,
        recipient: H160,
        token_ids: &[U256],
        uris: &[String],
    ) -> Result<MintReceipt> {
        if token_ids.len() != uris.len() {
            return Err(ticketmint_core::CoreError::Validation(format!(
                "token/uri count mismatch: {} vs {}",
                token_ids.len(),
                uris.len()
            )));
        }

        let calldata = encode_call(
            BATCH_MINT_SIG,
            &[
                AbiToken::Address(recipient),
                AbiToken::UintArray(token_ids.to_vec()),
                AbiToken::StrArray(uris.to_vec()),
            ],
        );

        let receipt = self
            .submit_and_confirm(contract, recipient, calldata)
            .await?;
        let block_number = receipt.block()?;

        tracing::info!(
            tx_hash = %format!("{:#x}", receipt.transaction_hash),
            block = block_number,
            tokens = token_ids.len(),
            "Batch mint confirmed"
        );

        Ok(MintReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number,
            token_ids: token_ids.to_vec(),
        })
    }

    async fn mint(
        &self,
        contract: H160,
        recipient: H160,
        token_id: U256,
        uri: String,
    ) -> Result<MintReceipt> {
        let calldata = encode_call(
            MINT_SIG,
            &[
                AbiToken::Address(recipient),
                AbiToken::Uint(token_id),
                AbiToken::Str(uri),
            ],
        );

        let receipt = self
            .submit_and_confirm(contract, recipient, calldata)
            .await?;
        let block_number = receipt.block()?;

        tracing::info!(
            tx_hash = %format!("{:#x}", receipt.transaction_hash),
            block = block_number,
            "Mint confirmed"
        );

        Ok(MintReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number,
            token_ids: vec![token_id],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_bounds() {
        let config = ContractConfig::default();
        assert!(config.confirmation_timeout > config.poll_interval);
    }

    #[test]
    fn batch_mint_signature_is_canonical() {
        // Canonical signatures carry no spaces or parameter names.
        assert!(!BATCH_MINT_SIG.contains(' '));
        assert!(!MINT_SIG.contains(' '));
    }
}
