//! RPC collaborator: the capability set every chain reader is written against.
//!
//! [`RpcClient`] is implemented by the HTTP JSON-RPC client and by the
//! failover [`crate::pool::Pool`], so readers do not care which one they hold.

pub mod client;
pub mod stack;

use std::sync::Arc;

use alloy::primitives::B256;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;

pub use client::{NeoRpcClient, NeoRpcDialer};
pub use stack::{ContractParam, StackItem};

/// `getversion` subset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeVersion {
    #[serde(default)]
    pub useragent: String,
    #[serde(default)]
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Protocol {
    #[serde(default)]
    pub network: u32,
}

/// Contract identity as returned by `getcontractstate` and `getnativecontracts`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractState {
    pub id: i32,
    #[serde(deserialize_with = "de_script_hash")]
    pub hash: ScriptHash,
    pub manifest: Manifest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub name: String,
}

fn de_script_hash<'de, D>(d: D) -> Result<ScriptHash, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    ScriptHash::from_hex(&s).map_err(serde::de::Error::custom)
}

/// Result of a read-only `invokefunction`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeResult {
    pub state: String,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub stack: Vec<StackItem>,
    #[serde(default)]
    pub session: Option<String>,
}

impl InvokeResult {
    /// Returns the stack of a successful invocation.
    ///
    /// A FAULT state or an empty stack are both treated as failures.
    pub fn into_stack(self) -> Result<Vec<StackItem>, ExporterError> {
        if self.state != "HALT" {
            return Err(ExporterError::Invocation(format!(
                "state {}: {}",
                self.state,
                self.exception.unwrap_or_default()
            )));
        }
        if self.stack.is_empty() {
            return Err(ExporterError::Invocation("result stack is empty".to_string()));
        }
        Ok(self.stack)
    }

    /// Top (last) stack item of a successful invocation.
    pub fn into_top(self) -> Result<StackItem, ExporterError> {
        let mut stack = self.into_stack()?;
        stack
            .pop()
            .ok_or_else(|| ExporterError::Invocation("result stack is empty".to_string()))
    }
}

/// `getstateheight` result.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StateHeight {
    #[serde(rename = "localrootindex")]
    pub local: u32,
    #[serde(rename = "validatedrootindex")]
    pub validated: u32,
}

/// Point queries against one chain endpoint.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Endpoint currently answering calls.
    fn endpoint(&self) -> String;

    async fn get_version(&self) -> Result<NodeVersion, ExporterError>;

    async fn get_block_count(&self) -> Result<u32, ExporterError>;

    async fn get_committee(&self) -> Result<Vec<PublicKey>, ExporterError>;

    async fn get_native_contracts(&self) -> Result<Vec<ContractState>, ExporterError>;

    async fn get_contract_state_by_id(&self, id: i32) -> Result<ContractState, ExporterError>;

    async fn invoke_function(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
    ) -> Result<InvokeResult, ExporterError>;

    /// Invokes a method returning an iterator and expands it page by page
    /// until an empty page is returned. The whole exchange runs against a
    /// single endpoint since iterator sessions are server-local.
    async fn invoke_and_traverse(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
        page_size: u32,
    ) -> Result<Vec<StackItem>, ExporterError>;

    async fn get_state_height(&self) -> Result<StateHeight, ExporterError>;

    async fn get_state_root(&self, height: u32) -> Result<B256, ExporterError>;

    async fn get_native_contract_hash(&self, name: &str) -> Result<ScriptHash, ExporterError> {
        let natives = self.get_native_contracts().await?;
        natives
            .into_iter()
            .find(|c| c.manifest.name.eq_ignore_ascii_case(name))
            .map(|c| c.hash)
            .ok_or_else(|| ExporterError::Rpc(format!("native contract {name} not found")))
    }
}

/// Opens initialized clients for endpoint addresses.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, ExporterError>;
}
