//! In-memory fetchers for job tests. A `None` source answers with an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use neo_exporter::fetcher::{
    AlphabetFetcher, BalanceFetcher, ContainerFetcher, GeoFetcher, HeightFetcher,
    InnerRingFetcher, NetmapFetcher, NotaryBalanceFetcher, StateFetcher,
};
use neo_exporter::locode::Position;
use neo_exporter::types::{
    node_id, CandidateNode, ContainerInfo, HeightData, NetmapCandidatesInfo, NetmapInfo, Node,
    StateData,
};
use neo_exporter::{ExporterError, PublicKey, ScriptHash};

const KEYS: [&str; 4] = [
    "02b3622bf4017bdfe317c58aed5f4c753f206b7db896046fa7d774bbc4bf7f8dc2",
    "036b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
    "037cf27b188d034f7e8a52380304b51ac3c08969e277f21b35a60b48fc47669978",
    "025ecbe4d1a6330a44c8f7ef951d4bf165e6c6b721efada985fb41661bc6e7fd6c",
];

pub fn key(i: usize) -> PublicKey {
    PublicKey::from_hex(KEYS[i]).unwrap()
}

pub fn node(i: usize, address: &str, locode: Option<&str>, capacity: Option<u64>) -> Node {
    let public_key = key(i);
    Node {
        id: node_id(public_key.as_bytes()),
        address: address.to_string(),
        public_key,
        attributes: HashMap::new(),
        locode: locode.map(str::to_string),
        capacity,
    }
}

fn fail<T>(what: &str) -> Result<T, ExporterError> {
    Err(ExporterError::Rpc(format!("{what} unavailable")))
}

#[derive(Default)]
pub struct Netmap {
    pub netmap: Option<NetmapInfo>,
    pub candidates: Option<Vec<CandidateNode>>,
}

#[async_trait]
impl NetmapFetcher for Netmap {
    async fn fetch_netmap(&self) -> Result<NetmapInfo, ExporterError> {
        self.netmap.clone().map_or_else(|| fail("netmap"), Ok)
    }

    async fn fetch_candidates(&self) -> Result<NetmapCandidatesInfo, ExporterError> {
        match &self.candidates {
            Some(nodes) => Ok(NetmapCandidatesInfo {
                nodes: nodes.clone(),
            }),
            None => fail("candidates"),
        }
    }
}

/// Key list for inner ring and alphabet reads.
pub struct Keys(pub Option<Vec<PublicKey>>);

#[async_trait]
impl InnerRingFetcher for Keys {
    async fn fetch_inner_ring_keys(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.0.clone().map_or_else(|| fail("inner ring"), Ok)
    }
}

#[async_trait]
impl AlphabetFetcher for Keys {
    async fn fetch_alphabet(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.0.clone().map_or_else(|| fail("alphabet"), Ok)
    }
}

/// Balances keyed by `(token, account)`; total supply keyed by token.
#[derive(Default)]
pub struct Balances {
    pub balances: HashMap<(ScriptHash, ScriptHash), f64>,
    pub supply: HashMap<ScriptHash, f64>,
    pub calls: AtomicUsize,
}

impl Balances {
    pub fn with(mut self, token: ScriptHash, account: ScriptHash, amount: f64) -> Self {
        self.balances.insert((token, account), amount);
        self
    }

    pub fn with_supply(mut self, token: ScriptHash, amount: f64) -> Self {
        self.supply.insert(token, amount);
        self
    }
}

#[async_trait]
impl BalanceFetcher for Balances {
    async fn fetch(&self, token: ScriptHash, account: ScriptHash) -> Result<f64, ExporterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.balances
            .get(&(token, account))
            .copied()
            .map_or_else(|| fail("balance"), Ok)
    }

    async fn fetch_total_supply(&self, token: ScriptHash) -> Result<f64, ExporterError> {
        self.supply
            .get(&token)
            .copied()
            .map_or_else(|| fail("total supply"), Ok)
    }

    async fn symbol(&self, _token: ScriptHash) -> Result<String, ExporterError> {
        Ok("GAS".to_string())
    }
}

#[derive(Default)]
pub struct Notary(pub HashMap<ScriptHash, f64>);

#[async_trait]
impl NotaryBalanceFetcher for Notary {
    async fn fetch_notary(&self, account: ScriptHash) -> Result<f64, ExporterError> {
        self.0
            .get(&account)
            .copied()
            .map_or_else(|| fail("notary balance"), Ok)
    }
}

#[derive(Default)]
pub struct Containers {
    pub total: Option<u64>,
    pub summaries: Option<Vec<ContainerInfo>>,
}

#[async_trait]
impl ContainerFetcher for Containers {
    async fn total(&self) -> Result<u64, ExporterError> {
        self.total.map_or_else(|| fail("container count"), Ok)
    }

    async fn report_summaries(&self) -> Result<Vec<ContainerInfo>, ExporterError> {
        self.summaries.clone().map_or_else(|| fail("summaries"), Ok)
    }
}

/// Fan-out double; records the height state roots were requested at.
#[derive(Default)]
pub struct Chain {
    pub heights: Vec<HeightData>,
    pub states: Vec<StateData>,
    pub state_height: Mutex<Option<u32>>,
}

impl Chain {
    pub fn requested_state_height(&self) -> Option<u32> {
        *self.state_height.lock().unwrap()
    }
}

#[async_trait]
impl HeightFetcher for Chain {
    async fn fetch_height(&self) -> Vec<HeightData> {
        self.heights.clone()
    }
}

#[async_trait]
impl StateFetcher for Chain {
    async fn fetch_state(&self, height: u32) -> Vec<StateData> {
        *self.state_height.lock().unwrap() = Some(height);
        self.states.clone()
    }
}

#[derive(Default)]
pub struct Geo(pub HashMap<String, Position>);

impl GeoFetcher for Geo {
    fn get(&self, locode: &str) -> Result<Position, ExporterError> {
        self.0
            .get(locode)
            .cloned()
            .ok_or_else(|| ExporterError::Locode(format!("no record for {locode}")))
    }
}
