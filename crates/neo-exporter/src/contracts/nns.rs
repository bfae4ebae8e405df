use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::{NNS_CONTRACT_ID, NNS_FS_ZONE, NNS_TXT_RECORD};
use crate::error::ExporterError;
use crate::fetcher::NnsResolver;
use crate::hash::ScriptHash;
use crate::rpc::{ContractParam, RpcClient, StackItem};

/// Name service reader used to locate NeoFS system contracts.
pub struct NnsContract {
    client: Arc<dyn RpcClient>,
    hash: ScriptHash,
}

impl NnsContract {
    pub fn new(client: Arc<dyn RpcClient>, hash: ScriptHash) -> Self {
        Self { client, hash }
    }

    /// Locates NNS by its fixed contract ID.
    pub async fn infer(client: Arc<dyn RpcClient>) -> Result<Self, ExporterError> {
        let state = client
            .get_contract_state_by_id(NNS_CONTRACT_ID)
            .await
            .map_err(|e| ExporterError::Rpc(format!("NNS contract state: {e}")))?;
        Ok(Self::new(client, state.hash))
    }

    pub fn hash(&self) -> ScriptHash {
        self.hash
    }

    /// First TXT record of `domain`.
    pub async fn resolve_txt(&self, domain: &str) -> Result<String, ExporterError> {
        let top = self
            .client
            .invoke_function(
                self.hash,
                "resolve",
                vec![
                    ContractParam::String(domain.to_string()),
                    ContractParam::Integer(NNS_TXT_RECORD),
                ],
            )
            .await?
            .into_top()?;

        // Older deployments return a single record, newer ones an array.
        let record = match &top {
            StackItem::Array(records) => records
                .first()
                .ok_or_else(|| ExporterError::Rpc(format!("NNS record for {domain} is missing")))?,
            single => single,
        };
        record.try_utf8()
    }
}

#[async_trait]
impl NnsResolver for NnsContract {
    async fn resolve_fs_contract(&self, name: &str) -> Result<ScriptHash, ExporterError> {
        let domain = format!("{name}.{NNS_FS_ZONE}");
        let record = self
            .resolve_txt(&domain)
            .await
            .map_err(|e| ExporterError::Rpc(format!("resolve {domain}: {e}")))?;
        record.parse()
    }
}

/// Resolver for chains without NNS; every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NnsNoOp;

#[async_trait]
impl NnsResolver for NnsNoOp {
    async fn resolve_fs_contract(&self, name: &str) -> Result<ScriptHash, ExporterError> {
        Err(ExporterError::Rpc(format!(
            "can't resolve {name}: no name service on this chain"
        )))
    }
}
