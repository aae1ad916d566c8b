//! Content-addressed metadata storage over an IPFS-compatible HTTP API.

use crate::error::ChainError;
use async_trait::async_trait;
use serde::Deserialize;
use ticketmint_core::chain::MetadataStore;
use ticketmint_core::{CoreError, NftMetadata, Result};

/// Response body of `/api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    /// Content hash of the stored document.
    #[serde(rename = "Hash")]
    hash: String,
}

/// [`MetadataStore`] backed by an IPFS node (or API-compatible pinning
/// service). The returned URI is `ipfs://<hash>`; because addresses are
/// derived from content, re-uploading an identical document is idempotent.
#[derive(Clone)]
pub struct IpfsMetadataStore {
    http: reqwest::Client,
    api_url: String,
}

impl IpfsMetadataStore {
    /// Create a store client for the given IPFS API base URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    async fn add(&self, bytes: Vec<u8>) -> std::result::Result<String, ChainError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("metadata.json")
            .mime_str("application/json")
            .map_err(|e| ChainError::UploadFailed(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChainError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::UploadFailed(format!(
                "status {status}: {body}"
            )));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| ChainError::ResponseParseFailed(e.to_string()))?;

        Ok(added.hash)
    }
}

#[async_trait]
impl MetadataStore for IpfsMetadataStore {
    async fn upload(&self, document: &NftMetadata) -> Result<String> {
        let bytes = document
            .to_json_bytes()
            .map_err(|e| CoreError::ExternalService(format!("metadata encoding: {e}")))?;

        let hash = self.add(bytes).await?;

        tracing::debug!(hash = %hash, name = %document.name, "Metadata uploaded");

        Ok(format!("ipfs://{hash}"))
    }
}
