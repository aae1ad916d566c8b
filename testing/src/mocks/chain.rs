//! Scriptable doubles for the chain collaborators.

use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use std::sync::{Arc, Mutex};
use ticketmint_core::chain::{MetadataStore, MintReceipt, NftContract};
use ticketmint_core::{CoreError, NftMetadata, Result};

/// A recorded contract invocation.
#[derive(Clone, Debug)]
pub struct MintCall {
    /// Contract address the call targeted.
    pub contract: H160,
    /// Recipient wallet.
    pub recipient: H160,
    /// Token ids in submission order.
    pub token_ids: Vec<U256>,
    /// Metadata URIs in submission order.
    pub uris: Vec<String>,
}

/// [`NftContract`] double that succeeds by default and can be scripted to
/// fail, recording every call for assertions.
#[derive(Clone, Default)]
pub struct MockNftContract {
    calls: Arc<Mutex<Vec<MintCall>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockNftContract {
    /// Create a contract double that confirms every mint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mint fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.into());
        }
    }

    /// Restore the default always-succeed behavior.
    pub fn succeed(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MintCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: MintCall) -> Result<MintReceipt> {
        let token_ids = call.token_ids.clone();
        self.calls
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?
            .push(call);

        let scripted = self
            .failure
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?
            .clone();
        if let Some(message) = scripted {
            return Err(CoreError::ExternalService(message));
        }

        Ok(MintReceipt {
            transaction_hash: H256::repeat_byte(0x42),
            block_number: 1,
            token_ids,
        })
    }
}

#[async_trait]
impl NftContract for MockNftContract {
    async fn batch_mint(
        &self,
        contract: H160,
        recipient: H160,
        token_ids: &[U256],
        uris: &[String],
    ) -> Result<MintReceipt> {
        self.record(MintCall {
            contract,
            recipient,
            token_ids: token_ids.to_vec(),
            uris: uris.to_vec(),
        })
    }

    async fn mint(
        &self,
        contract: H160,
        recipient: H160,
        token_id: U256,
        uri: String,
    ) -> Result<MintReceipt> {
        self.record(MintCall {
            contract,
            recipient,
            token_ids: vec![token_id],
            uris: vec![uri],
        })
    }
}

/// [`MetadataStore`] double producing deterministic `memory://` URIs.
#[derive(Clone, Default)]
pub struct MockMetadataStore {
    uploads: Arc<Mutex<Vec<NftMetadata>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockMetadataStore {
    /// Create a store double that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.into());
        }
    }

    /// Every document uploaded so far, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<NftMetadata> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn upload(&self, document: &NftMetadata) -> Result<String> {
        let scripted = self
            .failure
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?
            .clone();
        if let Some(message) = scripted {
            return Err(CoreError::ExternalService(message));
        }

        self.uploads
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?
            .push(document.clone());

        // Content-derived address so identical documents share a URI.
        Ok(format!("memory://{}", document.name.replace(' ', "-")))
    }
}
