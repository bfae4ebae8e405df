use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    ContractParam, ContractState, Dialer, InvokeResult, NodeVersion, RpcClient, StackItem,
    StateHeight,
};
use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct StateRoot {
    roothash: String,
}

/// JSON-RPC 2.0 client for a single node over HTTP.
pub struct NeoRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl NeoRpcClient {
    /// Builds the client; every request is bounded by `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExporterError> {
        url::Url::parse(endpoint)
            .map_err(|e| ExporterError::Rpc(format!("invalid endpoint {endpoint}: {e}")))?;
        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ExporterError::Rpc(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ExporterError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExporterError::Rpc(format!("{method}: {e}")))?;
        if !resp.status().is_success() {
            return Err(ExporterError::Rpc(format!(
                "{method}: http status {}",
                resp.status()
            )));
        }
        let parsed: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| ExporterError::Rpc(format!("{method}: bad response: {e}")))?;
        if let Some(err) = parsed.error {
            let data = err.data.map(|d| format!(" ({d})")).unwrap_or_default();
            return Err(ExporterError::Rpc(format!(
                "{method}: {} {}{data}",
                err.code, err.message
            )));
        }
        parsed
            .result
            .ok_or_else(|| ExporterError::Rpc(format!("{method}: empty result")))
    }

    async fn terminate_session(&self, session: &str) {
        if let Err(e) = self
            .call::<bool>("terminatesession", json!([session]))
            .await
        {
            tracing::debug!(endpoint = %self.endpoint, error = %e, "failed to terminate iterator session");
        }
    }

    async fn traverse(
        &self,
        session: &str,
        iterator: &str,
        page_size: u32,
    ) -> Result<Vec<StackItem>, ExporterError> {
        let mut out = Vec::new();
        loop {
            let page: Vec<StackItem> = self
                .call("traverseiterator", json!([session, iterator, page_size]))
                .await?;
            if page.is_empty() {
                return Ok(out);
            }
            out.extend(page);
        }
    }
}

fn params_json(params: Vec<ContractParam>) -> Value {
    Value::Array(params.into_iter().map(Value::from).collect())
}

#[async_trait]
impl RpcClient for NeoRpcClient {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn get_version(&self) -> Result<NodeVersion, ExporterError> {
        self.call("getversion", json!([])).await
    }

    async fn get_block_count(&self) -> Result<u32, ExporterError> {
        self.call("getblockcount", json!([])).await
    }

    async fn get_committee(&self) -> Result<Vec<PublicKey>, ExporterError> {
        let raw: Vec<String> = self.call("getcommittee", json!([])).await?;
        raw.iter().map(|k| PublicKey::from_hex(k)).collect()
    }

    async fn get_native_contracts(&self) -> Result<Vec<ContractState>, ExporterError> {
        self.call("getnativecontracts", json!([])).await
    }

    async fn get_contract_state_by_id(&self, id: i32) -> Result<ContractState, ExporterError> {
        self.call("getcontractstate", json!([id])).await
    }

    async fn invoke_function(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
    ) -> Result<InvokeResult, ExporterError> {
        self.call(
            "invokefunction",
            json!([format!("0x{contract}"), method, params_json(params)]),
        )
        .await
    }

    async fn invoke_and_traverse(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
        page_size: u32,
    ) -> Result<Vec<StackItem>, ExporterError> {
        let res = self.invoke_function(contract, method, params).await?;
        let session = res.session.clone();
        let top = res.into_top()?;
        let iterator = top.iterator_id()?;
        let session = session.ok_or_else(|| {
            ExporterError::Rpc(format!("{method}: node returned no iterator session"))
        })?;
        let items = self.traverse(&session, iterator, page_size).await;
        self.terminate_session(&session).await;
        items
    }

    async fn get_state_height(&self) -> Result<StateHeight, ExporterError> {
        self.call("getstateheight", json!([])).await
    }

    async fn get_state_root(&self, height: u32) -> Result<B256, ExporterError> {
        let root: StateRoot = self.call("getstateroot", json!([height])).await?;
        root.roothash.parse::<B256>().map_err(|e| {
            ExporterError::Rpc(format!("getstateroot: bad root hash {}: {e}", root.roothash))
        })
    }
}

/// Dials [`NeoRpcClient`]s; a dial succeeds only once `getversion` answers.
#[derive(Debug, Clone)]
pub struct NeoRpcDialer {
    timeout: Duration,
}

impl NeoRpcDialer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Dialer for NeoRpcDialer {
    async fn dial(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, ExporterError> {
        let client = NeoRpcClient::new(endpoint, self.timeout)?;
        let version = client.get_version().await?;
        tracing::debug!(
            endpoint,
            useragent = %version.useragent,
            network = version.protocol.network,
            "rpc client initialized"
        );
        Ok(Arc::new(client))
    }
}
