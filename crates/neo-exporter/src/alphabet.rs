//! Strategies for obtaining alphabet keys.

use std::sync::Arc;

use async_trait::async_trait;

use crate::contracts::role::designated_alphabet;
use crate::error::ExporterError;
use crate::fetcher::AlphabetFetcher;
use crate::keys::PublicKey;
use crate::rpc::RpcClient;

/// Alphabet of the FS chain: its committee.
pub struct CommitteeAlphabet {
    client: Arc<dyn RpcClient>,
}

impl CommitteeAlphabet {
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlphabetFetcher for CommitteeAlphabet {
    async fn fetch_alphabet(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.client.get_committee().await
    }
}

/// Alphabet of the main chain: keys designated for the NeoFS alphabet role
/// at the current height.
pub struct DesignatedAlphabet {
    client: Arc<dyn RpcClient>,
}

impl DesignatedAlphabet {
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlphabetFetcher for DesignatedAlphabet {
    async fn fetch_alphabet(&self) -> Result<Vec<PublicKey>, ExporterError> {
        designated_alphabet(self.client.as_ref())
            .await
            .map_err(|e| ExporterError::Rpc(format!("can't get designated alphabet: {e}")))
    }
}
