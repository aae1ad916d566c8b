//! Error types for the chain clients.

use thiserror::Error;

/// Errors from the JSON-RPC node, the contract, or metadata storage.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP transport failed before a response arrived.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error (code {code}): {message}")]
    RpcError {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// A response could not be decoded.
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The transaction was included but reverted.
    #[error("Transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: String,
    },

    /// No receipt appeared within the confirmation window.
    ///
    /// The transaction may still confirm later; the broadcast cannot be
    /// cancelled locally.
    #[error("Confirmation timed out after {seconds}s for {tx_hash}")]
    ConfirmationTimeout {
        /// Hash of the pending transaction.
        tx_hash: String,
        /// Configured confirmation window.
        seconds: u64,
    },

    /// Metadata upload failed.
    #[error("Metadata upload failed: {0}")]
    UploadFailed(String),
}

impl From<ChainError> for ticketmint_core::CoreError {
    fn from(err: ChainError) -> Self {
        Self::ExternalService(err.to_string())
    }
}
