//! Minimal JSON-RPC 2.0 client for an Ethereum-compatible node.

use crate::error::ChainError;
use primitive_types::{H160, H256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A transaction submitted via `eth_sendTransaction`.
///
/// The `from` account must be managed by the connected node or signer
/// proxy; this client never handles private keys itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Sending account.
    pub from: H160,
    /// Target contract.
    pub to: H160,
    /// Hex-encoded calldata.
    pub data: String,
}

/// A transaction receipt, reduced to the fields the minter reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: H256,
    /// Inclusion block, as a hex quantity.
    pub block_number: String,
    /// Execution status: `0x1` success, `0x0` revert.
    pub status: String,
}

impl TransactionReceipt {
    /// Whether the transaction executed successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == "0x1"
    }

    /// Inclusion block number.
    ///
    /// # Errors
    ///
    /// Returns an error if the node sent a malformed quantity.
    pub fn block(&self) -> Result<u64, ChainError> {
        parse_quantity(&self.block_number)
    }
}

/// Parse a `0x`-prefixed hex quantity.
///
/// # Errors
///
/// Returns `ResponseParseFailed` for a missing prefix or invalid digits.
pub fn parse_quantity(value: &str) -> Result<u64, ChainError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::ResponseParseFailed(format!("quantity without 0x: {value}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::ResponseParseFailed(format!("bad quantity {value}: {e}")))
}

/// JSON-RPC client over HTTP.
#[derive(Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    /// Create a client for the given node endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Invoke a JSON-RPC method.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on transport errors, `RpcError` when the
    /// node answers with an error object, and `ResponseParseFailed` when
    /// the result cannot be decoded (including a null result).
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ChainError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::RequestFailed(e.to_string()))?;

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| ChainError::ResponseParseFailed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ChainError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        body.result.ok_or_else(|| {
            ChainError::ResponseParseFailed(format!("null result for {method}"))
        })
    }

    /// Invoke a method whose result may legitimately be `null`,
    /// e.g. `eth_getTransactionReceipt` for a pending transaction.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed`, `RpcError`, or `ResponseParseFailed` as
    /// for [`call`](Self::call).
    pub async fn call_optional<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<R>, ChainError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::RequestFailed(e.to_string()))?;

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| ChainError::ResponseParseFailed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ChainError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body.result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1a").unwrap(), 26);
        assert!(parse_quantity("26").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn receipt_status() {
        let receipt = TransactionReceipt {
            transaction_hash: H256::zero(),
            block_number: "0x10".to_string(),
            status: "0x1".to_string(),
        };
        assert!(receipt.succeeded());
        assert_eq!(receipt.block().unwrap(), 16);

        let reverted = TransactionReceipt {
            status: "0x0".to_string(),
            ..receipt
        };
        assert!(!reverted.succeeded());
    }

    #[test]
    fn transaction_request_serializes_camel_case() {
        let tx = TransactionRequest {
            from: H160::repeat_byte(1),
            to: H160::repeat_byte(2),
            data: "0xdeadbeef".to_string(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("from").is_some());
        assert!(json.get("to").is_some());
        assert_eq!(json["data"], "0xdeadbeef");
    }
}
