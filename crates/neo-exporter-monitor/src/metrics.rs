use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "neo_exporter";

/// Which chain the process monitors; selects the registered families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    FsChain,
    MainChain,
}

/// Gauge families published by the exporter, bound to a private registry.
///
/// Every family exists in both modes so jobs can hold one type, but only the
/// families of the selected [`ChainMode`] are registered and exposed.
pub struct Metrics {
    registry: Registry,

    pub version: GaugeVec,
    pub alphabet_public_key: GaugeVec,
    pub nep17_balance: GaugeVec,
    pub nep17_total_supply: GaugeVec,

    // FS chain
    pub netmap: GaugeVec,
    pub netmap_new: Gauge,
    pub netmap_dropped: Gauge,
    pub epoch: Gauge,
    pub sn_balance: GaugeVec,
    pub sn_balance_notary: GaugeVec,
    pub sn_capacity: GaugeVec,
    pub sn_capacity_total: Gauge,
    pub candidate_info: GaugeVec,
    pub ir_balance: GaugeVec,
    pub proxy_balance: Gauge,
    pub fs_chain_supply: Gauge,
    pub alphabet_balance_notary: GaugeVec,
    pub alphabet_divergence: GaugeVec,
    pub containers_number: Gauge,
    pub container_size: GaugeVec,
    pub container_objects: GaugeVec,
    pub chain_height: GaugeVec,
    pub chain_state: GaugeVec,

    // Main chain
    pub alphabet_balance: GaugeVec,
    pub main_chain_supply: Gauge,
}

fn gauge(name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
    Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))
}

fn gauge_vec(name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec, prometheus::Error> {
    GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
}

impl Metrics {
    pub fn new(mode: ChainMode) -> Result<Self, prometheus::Error> {
        let metrics = Self {
            registry: Registry::new(),

            version: gauge_vec("version", "Exporter version", &["version"])?,
            alphabet_public_key: gauge_vec(
                "alphabet_public_key",
                "Alphabet public keys in chain",
                &["key"],
            )?,
            nep17_balance: gauge_vec(
                "nep_17_balance",
                "NEP-17 balance of contract and account",
                &["label", "symbol", "contract", "account"],
            )?,
            nep17_total_supply: gauge_vec(
                "nep_17_total_supply",
                "NEP-17 total supply of contract",
                &["label", "symbol", "contract"],
            )?,

            netmap: gauge_vec(
                "netmap",
                "Locations where NeoFS storage nodes are located",
                &["location", "longitude", "latitude"],
            )?,
            netmap_new: gauge(
                "netmap_new",
                "Amount of nodes that will be added to network in the next epoch",
            )?,
            netmap_dropped: gauge(
                "netmap_dropped",
                "Amount of nodes that will be dropped from network in the next epoch",
            )?,
            epoch: gauge("epoch", "Epoch number of NeoFS network")?,
            sn_balance: gauge_vec("sn_balance", "FS chain GAS amount of storage nodes", &["key"])?,
            sn_balance_notary: gauge_vec(
                "sn_balance_notary",
                "FS chain notary balance of storage nodes",
                &["key"],
            )?,
            sn_capacity: gauge_vec(
                "sn_capacity",
                "Storage node capacity (GB)",
                &["host", "key"],
            )?,
            sn_capacity_total: gauge("sn_capacity_total", "Storage nodes total capacity (GB)")?,
            candidate_info: gauge_vec(
                "candidate_info",
                "Candidate node info",
                &["host", "last_active_epoch"],
            )?,
            ir_balance: gauge_vec(
                "ir_balance",
                "FS chain GAS amount of inner ring nodes",
                &["key"],
            )?,
            proxy_balance: gauge("proxy_balance", "FS chain GAS amount of proxy contract")?,
            fs_chain_supply: gauge("fs_chain_supply", "FS chain total supply of balance contract")?,
            alphabet_balance_notary: gauge_vec(
                "alphabet_balance_notary",
                "FS chain notary balance of alphabet nodes",
                &["key"],
            )?,
            alphabet_divergence: gauge_vec(
                "alphabet_divergence",
                "Alphabet keys present on one chain only",
                &["chain", "key"],
            )?,
            containers_number: gauge("containers_number", "Number of available containers")?,
            container_size: gauge_vec(
                "container_size",
                "Reported container size in bytes",
                &["cid"],
            )?,
            container_objects: gauge_vec(
                "container_objects",
                "Reported number of objects in container",
                &["cid"],
            )?,
            chain_height: gauge_vec("chain_height", "Chain height in blocks", &["host"])?,
            chain_state: gauge_vec(
                "chain_state",
                "Chain state hash in specific height",
                &["host", "hash"],
            )?,

            alphabet_balance: gauge_vec(
                "alphabet_balance",
                "Main chain GAS amount of alphabet nodes",
                &["key"],
            )?,
            main_chain_supply: gauge(
                "main_chain_supply",
                "Main chain GAS amount of neofs contract",
            )?,
        };
        metrics.register(mode)?;
        Ok(metrics)
    }

    fn register(&self, mode: ChainMode) -> Result<(), prometheus::Error> {
        let r = &self.registry;
        r.register(Box::new(self.version.clone()))?;
        r.register(Box::new(self.alphabet_public_key.clone()))?;
        r.register(Box::new(self.nep17_balance.clone()))?;
        r.register(Box::new(self.nep17_total_supply.clone()))?;

        match mode {
            ChainMode::FsChain => {
                r.register(Box::new(self.netmap.clone()))?;
                r.register(Box::new(self.netmap_new.clone()))?;
                r.register(Box::new(self.netmap_dropped.clone()))?;
                r.register(Box::new(self.epoch.clone()))?;
                r.register(Box::new(self.sn_balance.clone()))?;
                r.register(Box::new(self.sn_balance_notary.clone()))?;
                r.register(Box::new(self.sn_capacity.clone()))?;
                r.register(Box::new(self.sn_capacity_total.clone()))?;
                r.register(Box::new(self.candidate_info.clone()))?;
                r.register(Box::new(self.ir_balance.clone()))?;
                r.register(Box::new(self.proxy_balance.clone()))?;
                r.register(Box::new(self.fs_chain_supply.clone()))?;
                r.register(Box::new(self.alphabet_balance_notary.clone()))?;
                r.register(Box::new(self.alphabet_divergence.clone()))?;
                r.register(Box::new(self.containers_number.clone()))?;
                r.register(Box::new(self.container_size.clone()))?;
                r.register(Box::new(self.container_objects.clone()))?;
                r.register(Box::new(self.chain_height.clone()))?;
                r.register(Box::new(self.chain_state.clone()))?;
            }
            ChainMode::MainChain => {
                r.register(Box::new(self.alphabet_balance.clone()))?;
                r.register(Box::new(self.main_chain_supply.clone()))?;
            }
        }
        Ok(())
    }

    /// Publishes the running binary version as a constant series.
    pub fn set_version(&self, version: &str) {
        self.version.with_label_values(&[version]).set(1.0);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered family.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
