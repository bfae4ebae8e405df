use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use neo_exporter::constants::GAS_CONTRACT;
use neo_exporter::diff::{compute_unique_alphabets, get_diff};
use neo_exporter::fetcher::{
    AlphabetFetcher, BalanceFetcher, ContainerFetcher, GeoFetcher, HeightFetcher,
    InnerRingFetcher, NetmapFetcher, NotaryBalanceFetcher, StateFetcher,
};
use neo_exporter::keys::sorted_hex;
use neo_exporter::types::{NetmapCandidatesInfo, NetmapInfo, Node};
use neo_exporter::{PublicKey, ScriptHash};

use super::{publish_alphabet_keys, Job, Nep17Tracker};
use crate::metrics::Metrics;

pub struct FsChainJobArgs {
    pub metrics: Arc<Metrics>,
    /// Balance contract; its total supply is the FS chain supply.
    pub balance: ScriptHash,
    pub proxy: Option<ScriptHash>,
    pub netmap: Arc<dyn NetmapFetcher>,
    pub inner_ring: Arc<dyn InnerRingFetcher>,
    pub alphabet: Arc<dyn AlphabetFetcher>,
    /// Main chain alphabet to compare against, when main endpoints are set.
    pub main_alphabet: Option<Arc<dyn AlphabetFetcher>>,
    pub balances: Arc<dyn BalanceFetcher>,
    pub notary: Arc<dyn NotaryBalanceFetcher>,
    pub containers: Arc<dyn ContainerFetcher>,
    pub heights: Arc<dyn HeightFetcher>,
    pub states: Arc<dyn StateFetcher>,
    pub geo: Option<Arc<dyn GeoFetcher>>,
    pub nep17: Option<Nep17Tracker>,
}

/// FS chain scrape.
///
/// Steps run in a fixed order and fail independently. A step whose source
/// read fails leaves its gauges as they were; a step that succeeds replaces
/// its label sets, omitting entities whose own lookup failed.
pub struct FsChainJob {
    metrics: Arc<Metrics>,
    balance: ScriptHash,
    proxy: Option<ScriptHash>,
    netmap: Arc<dyn NetmapFetcher>,
    inner_ring: Arc<dyn InnerRingFetcher>,
    alphabet: Arc<dyn AlphabetFetcher>,
    main_alphabet: Option<Arc<dyn AlphabetFetcher>>,
    balances: Arc<dyn BalanceFetcher>,
    notary: Arc<dyn NotaryBalanceFetcher>,
    containers: Arc<dyn ContainerFetcher>,
    heights: Arc<dyn HeightFetcher>,
    states: Arc<dyn StateFetcher>,
    geo: Option<Arc<dyn GeoFetcher>>,
    nep17: Option<Nep17Tracker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeLocation {
    name: String,
    longitude: String,
    latitude: String,
}

/// Per-node lookups of one netmap pass.
struct NodeReport {
    key: String,
    gas: Option<f64>,
    notary: Option<f64>,
    location: Option<NodeLocation>,
}

impl FsChainJob {
    pub fn new(args: FsChainJobArgs) -> Self {
        Self {
            metrics: args.metrics,
            balance: args.balance,
            proxy: args.proxy,
            netmap: args.netmap,
            inner_ring: args.inner_ring,
            alphabet: args.alphabet,
            main_alphabet: args.main_alphabet,
            balances: args.balances,
            notary: args.notary,
            containers: args.containers,
            heights: args.heights,
            states: args.states,
            geo: args.geo,
            nep17: args.nep17,
        }
    }

    async fn inspect_node(&self, node: &Node) -> NodeReport {
        let key = node.public_key.to_hex();
        let account = node.public_key.script_hash();

        let gas = match self.balances.fetch(GAS_CONTRACT, account).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "can't fetch GAS balance");
                None
            }
        };

        let location = match (&self.geo, &node.locode) {
            (Some(geo), Some(locode)) => match geo.get(locode) {
                Ok(pos) => Some(NodeLocation {
                    name: pos.location,
                    longitude: format!("{:.4}", pos.longitude),
                    latitude: format!("{:.4}", pos.latitude),
                }),
                Err(e) => {
                    tracing::debug!(key = %key, locode = %locode, error = %e,
                        "can't fetch geoposition of node from the NeoFS network map");
                    None
                }
            },
            _ => None,
        };

        let notary = match self.notary.fetch_notary(account).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(key = %key, error = %e,
                    "can't fetch notary balance of node from the NeoFS network map");
                None
            }
        };

        NodeReport {
            key,
            gas,
            notary,
            location,
        }
    }

    async fn process_network_map(&self, nm: &NetmapInfo, candidates: &NetmapCandidatesInfo) {
        let m = &self.metrics;
        let (joined, dropped) = get_diff(&nm.nodes, candidates.nodes());

        let reports = join_all(nm.nodes.iter().map(|n| self.inspect_node(n))).await;

        m.sn_capacity.reset();
        let mut total_capacity = 0.0;
        for (node, report) in nm.nodes.iter().zip(&reports) {
            let capacity = node.capacity.unwrap_or_default() as f64;
            total_capacity += capacity;
            m.sn_capacity
                .with_label_values(&[node.address.as_str(), report.key.as_str()])
                .set(capacity);
        }
        m.sn_capacity_total.set(total_capacity);

        log_nodes("new node", &joined);
        log_nodes("dropped node", &dropped);

        m.epoch.set(nm.epoch as f64);
        m.netmap_dropped.set(dropped.len() as f64);
        m.netmap_new.set(joined.len() as f64);

        let mut locations: HashMap<&NodeLocation, u32> = HashMap::new();
        for loc in reports.iter().filter_map(|r| r.location.as_ref()) {
            *locations.entry(loc).or_default() += 1;
        }
        m.netmap.reset();
        for (loc, count) in locations {
            m.netmap
                .with_label_values(&[
                    loc.name.as_str(),
                    loc.longitude.as_str(),
                    loc.latitude.as_str(),
                ])
                .set(f64::from(count));
        }

        m.sn_balance.reset();
        m.sn_balance_notary.reset();
        for report in &reports {
            if let Some(gas) = report.gas {
                m.sn_balance.with_label_values(&[report.key.as_str()]).set(gas);
            }
            if let Some(notary) = report.notary {
                m.sn_balance_notary
                    .with_label_values(&[report.key.as_str()])
                    .set(notary);
            }
        }

        m.candidate_info.reset();
        for candidate in &candidates.nodes {
            if let Some(epoch) = candidate.last_active_epoch {
                let epoch = epoch.to_string();
                m.candidate_info
                    .with_label_values(&[candidate.node.address.as_str(), epoch.as_str()])
                    .set(1.0);
            }
        }
    }

    async fn process_inner_ring(&self, keys: &[PublicKey]) {
        let mut export = HashMap::with_capacity(keys.len());
        for key in keys {
            let key_hex = key.to_hex();
            match self.balances.fetch(GAS_CONTRACT, key.script_hash()).await {
                Ok(balance) => {
                    export.insert(key_hex, balance);
                }
                Err(e) => tracing::debug!(key = %key_hex, error = %e,
                    "can't fetch GAS balance of the NeoFS Inner Ring member"),
            }
        }

        self.metrics.ir_balance.reset();
        for (key, balance) in export {
            self.metrics
                .ir_balance
                .with_label_values(&[key.as_str()])
                .set(balance);
        }
    }

    async fn process_proxy(&self, proxy: ScriptHash) {
        match self.balances.fetch(GAS_CONTRACT, proxy).await {
            Ok(balance) => self.metrics.proxy_balance.set(balance),
            Err(e) => tracing::debug!(address = %proxy, error = %e,
                "can't fetch proxy contract balance"),
        }
    }

    async fn process_supply(&self) {
        match self.balances.fetch_total_supply(self.balance).await {
            Ok(supply) => self.metrics.fs_chain_supply.set(supply),
            Err(e) => tracing::debug!(address = %self.balance, error = %e,
                "can't fetch balance contract total supply"),
        }
    }

    async fn process_alphabet(&self, alphabet: &[PublicKey]) {
        let mut export = HashMap::with_capacity(alphabet.len());
        for key in alphabet {
            let key_hex = key.to_hex();
            match self.notary.fetch_notary(key.script_hash()).await {
                Ok(balance) => {
                    export.insert(key_hex, balance);
                }
                Err(e) => tracing::debug!(key = %key_hex, error = %e,
                    "can't fetch notary balance of the NeoFS Alphabet member"),
            }
        }

        self.metrics.alphabet_balance_notary.reset();
        for (key, balance) in export {
            self.metrics
                .alphabet_balance_notary
                .with_label_values(&[key.as_str()])
                .set(balance);
        }
    }

    async fn process_divergence(&self, main: &dyn AlphabetFetcher, fs_alphabet: Vec<PublicKey>) {
        let main_alphabet = match main.fetch_alphabet().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "can't read main chain Alphabet members");
                return;
            }
        };

        let main_sorted = sorted_hex(main_alphabet);
        let fs_sorted = sorted_hex(fs_alphabet);
        let (only_main, only_fs) = compute_unique_alphabets(&main_sorted, &fs_sorted);
        if !only_main.is_empty() || !only_fs.is_empty() {
            tracing::warn!(main = ?only_main, fs = ?only_fs, "alphabets of main and FS chains differ");
        }

        let gauge = &self.metrics.alphabet_divergence;
        gauge.reset();
        for key in &only_main {
            gauge.with_label_values(&["main", key.as_str()]).set(1.0);
        }
        for key in &only_fs {
            gauge.with_label_values(&["fs", key.as_str()]).set(1.0);
        }
    }

    async fn process_containers(&self) {
        match self.containers.total().await {
            Ok(total) => self.metrics.containers_number.set(total as f64),
            Err(e) => tracing::warn!(error = %e, "can't fetch number of available containers"),
        }

        match self.containers.report_summaries().await {
            Ok(summaries) => {
                let m = &self.metrics;
                m.container_size.reset();
                m.container_objects.reset();
                for cnr in summaries {
                    m.container_size
                        .with_label_values(&[cnr.id.as_str()])
                        .set(cnr.size as f64);
                    m.container_objects
                        .with_label_values(&[cnr.id.as_str()])
                        .set(cnr.objects as f64);
                }
            }
            Err(e) => tracing::warn!(error = %e, "can't fetch container report summaries"),
        }
    }

    /// Publishes per-host heights and returns the lowest non-zero one.
    async fn process_chain_height(&self) -> Option<u32> {
        let heights = self.heights.fetch_height().await;
        if heights.is_empty() {
            tracing::warn!("no host reported its state height");
            return None;
        }

        self.metrics.chain_height.reset();
        for h in &heights {
            self.metrics
                .chain_height
                .with_label_values(&[h.host.as_str()])
                .set(f64::from(h.value));
        }
        heights.iter().map(|h| h.value).filter(|v| *v > 0).min()
    }

    async fn process_chain_state(&self, height: u32) {
        let states = self.states.fetch_state(height).await;
        if states.is_empty() {
            tracing::warn!(height, "no host reported its state root");
            return;
        }

        self.metrics.chain_state.reset();
        for s in &states {
            self.metrics
                .chain_state
                .with_label_values(&[s.host.as_str(), s.value.as_str()])
                .set(f64::from(height));
        }
    }
}

fn log_nodes(event: &str, nodes: &[&Node]) {
    for node in nodes {
        tracing::info!(
            id = node.id,
            address = %node.address,
            public_key = %node.public_key,
            attributes = ?node.attributes,
            "{event}"
        );
    }
}

#[async_trait]
impl Job for FsChainJob {
    async fn process(&self) {
        tracing::debug!("retrieving data from FS chain");

        match self.netmap.fetch_netmap().await {
            Ok(netmap) => match self.netmap.fetch_candidates().await {
                Ok(candidates) => self.process_network_map(&netmap, &candidates).await,
                Err(e) => tracing::warn!(error = %e, "can't read NeoFS network map candidates"),
            },
            Err(e) => tracing::warn!(error = %e, "can't read NeoFS network map"),
        }

        match self.inner_ring.fetch_inner_ring_keys().await {
            Ok(keys) => self.process_inner_ring(&keys).await,
            Err(e) => tracing::warn!(error = %e, "can't read NeoFS Inner Ring members"),
        }

        if let Some(proxy) = self.proxy {
            self.process_proxy(proxy).await;
        }

        self.process_supply().await;

        match self.alphabet.fetch_alphabet().await {
            Ok(alphabet) => {
                publish_alphabet_keys(&self.metrics, &alphabet);
                self.process_alphabet(&alphabet).await;
                if let Some(main) = &self.main_alphabet {
                    self.process_divergence(main.as_ref(), alphabet).await;
                }
            }
            Err(e) => tracing::warn!(error = %e, "can't read NeoFS Alphabet members"),
        }

        self.process_containers().await;

        if let Some(height) = self.process_chain_height().await {
            self.process_chain_state(height).await;
        }

        if let Some(tracker) = &self.nep17 {
            tracker.process().await;
        }
    }
}
