//! In-memory chain doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::B256;
use async_trait::async_trait;

use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;
use crate::rpc::{
    ContractParam, ContractState, Dialer, InvokeResult, Manifest, NodeVersion, RpcClient,
    StackItem, StateHeight,
};

type Responses = HashMap<String, Result<Vec<StackItem>, String>>;

/// A node whose availability and answers are controlled by the test.
pub struct MockNode {
    endpoint: String,
    up: AtomicBool,
    fail_calls: AtomicBool,
    probes: AtomicUsize,
    height: AtomicU32,
    root: Mutex<B256>,
    committee: Mutex<Vec<PublicKey>>,
    natives: Mutex<Vec<ContractState>>,
    contracts_by_id: Mutex<HashMap<i32, ScriptHash>>,
    invokes: Mutex<Responses>,
    traversals: Mutex<Responses>,
    calls: Mutex<Vec<(ScriptHash, String, Vec<ContractParam>)>>,
}

impl MockNode {
    pub fn new(endpoint: &str) -> Arc<Self> {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            up: AtomicBool::new(true),
            fail_calls: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
            height: AtomicU32::new(100),
            root: Mutex::new(B256::ZERO),
            committee: Mutex::new(Vec::new()),
            natives: Mutex::new(Vec::new()),
            contracts_by_id: Mutex::new(HashMap::new()),
            invokes: Mutex::new(HashMap::new()),
            traversals: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    /// Makes every call other than the liveness probe fail.
    pub fn fail_calls(&self, fail: bool) {
        self.fail_calls.store(fail, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn set_height(&self, height: u32) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn set_root(&self, root: B256) {
        *self.root.lock().unwrap() = root;
    }

    pub fn set_committee(&self, keys: Vec<PublicKey>) {
        *self.committee.lock().unwrap() = keys;
    }

    pub fn add_native(&self, name: &str, hash: ScriptHash) {
        self.natives.lock().unwrap().push(ContractState {
            id: -1,
            hash,
            manifest: Manifest {
                name: name.to_string(),
            },
        });
    }

    pub fn add_contract(&self, id: i32, hash: ScriptHash) {
        self.contracts_by_id.lock().unwrap().insert(id, hash);
    }

    pub fn on_invoke(&self, method: &str, stack: Vec<StackItem>) {
        self.invokes
            .lock()
            .unwrap()
            .insert(method.to_string(), Ok(stack));
    }

    pub fn on_invoke_fault(&self, method: &str, exception: &str) {
        self.invokes
            .lock()
            .unwrap()
            .insert(method.to_string(), Err(exception.to_string()));
    }

    pub fn on_traverse(&self, method: &str, items: Vec<StackItem>) {
        self.traversals
            .lock()
            .unwrap()
            .insert(method.to_string(), Ok(items));
    }

    /// Recorded invocations as `(contract, method, params)`.
    pub fn calls(&self) -> Vec<(ScriptHash, String, Vec<ContractParam>)> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ExporterError> {
        if !self.up.load(Ordering::SeqCst) {
            return Err(ExporterError::Rpc(format!("{} is down", self.endpoint)));
        }
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(ExporterError::Rpc(format!("{} call failed", self.endpoint)));
        }
        Ok(())
    }
}

#[async_trait]
impl RpcClient for MockNode {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn get_version(&self) -> Result<NodeVersion, ExporterError> {
        self.check()?;
        Ok(NodeVersion::default())
    }

    async fn get_block_count(&self) -> Result<u32, ExporterError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.up.load(Ordering::SeqCst) {
            return Err(ExporterError::Rpc(format!("{} is down", self.endpoint)));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn get_committee(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.check()?;
        Ok(self.committee.lock().unwrap().clone())
    }

    async fn get_native_contracts(&self) -> Result<Vec<ContractState>, ExporterError> {
        self.check()?;
        Ok(self.natives.lock().unwrap().clone())
    }

    async fn get_contract_state_by_id(&self, id: i32) -> Result<ContractState, ExporterError> {
        self.check()?;
        let hash = self
            .contracts_by_id
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .ok_or_else(|| ExporterError::Rpc(format!("unknown contract {id}")))?;
        Ok(ContractState {
            id,
            hash,
            manifest: Manifest {
                name: format!("contract-{id}"),
            },
        })
    }

    async fn invoke_function(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
    ) -> Result<InvokeResult, ExporterError> {
        self.check()?;
        self.calls
            .lock()
            .unwrap()
            .push((contract, method.to_string(), params));
        let response = self.invokes.lock().unwrap().get(method).cloned();
        match response {
            Some(Ok(stack)) => Ok(InvokeResult {
                state: "HALT".to_string(),
                exception: None,
                stack,
                session: None,
            }),
            Some(Err(exception)) => Ok(InvokeResult {
                state: "FAULT".to_string(),
                exception: Some(exception),
                stack: Vec::new(),
                session: None,
            }),
            None => Err(ExporterError::Rpc(format!("no response for {method}"))),
        }
    }

    async fn invoke_and_traverse(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
        _page_size: u32,
    ) -> Result<Vec<StackItem>, ExporterError> {
        self.check()?;
        self.calls
            .lock()
            .unwrap()
            .push((contract, method.to_string(), params));
        match self.traversals.lock().unwrap().get(method).cloned() {
            Some(Ok(items)) => Ok(items),
            Some(Err(e)) => Err(ExporterError::Invocation(e)),
            None => Err(ExporterError::Rpc(format!("no response for {method}"))),
        }
    }

    async fn get_state_height(&self) -> Result<StateHeight, ExporterError> {
        self.check()?;
        let h = self.height.load(Ordering::SeqCst);
        Ok(StateHeight {
            local: h,
            validated: h,
        })
    }

    async fn get_state_root(&self, _height: u32) -> Result<B256, ExporterError> {
        self.check()?;
        Ok(*self.root.lock().unwrap())
    }
}

/// Dialer over a fixed set of [`MockNode`]s; a dial succeeds while the node is up.
pub struct MockDialer {
    order: Vec<String>,
    nodes: HashMap<String, Arc<MockNode>>,
    dials: Mutex<HashMap<String, usize>>,
    attempts: AtomicUsize,
}

impl MockDialer {
    pub fn with_nodes(endpoints: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            order: endpoints.iter().map(|e| e.to_string()).collect(),
            nodes: endpoints
                .iter()
                .map(|e| (e.to_string(), MockNode::new(e)))
                .collect(),
            dials: Mutex::new(HashMap::new()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn node(&self, endpoint: &str) -> Arc<MockNode> {
        Arc::clone(&self.nodes[endpoint])
    }

    /// Dial attempts, successful or not.
    pub fn dial_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successful dials of one endpoint.
    pub fn dial_count_of(&self, endpoint: &str) -> usize {
        self.dials
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, ExporterError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let node = self
            .nodes
            .get(endpoint)
            .ok_or_else(|| ExporterError::Rpc(format!("unknown endpoint {endpoint}")))?;
        node.get_version().await?;
        *self
            .dials
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default() += 1;
        Ok(Arc::clone(node) as Arc<dyn RpcClient>)
    }
}
