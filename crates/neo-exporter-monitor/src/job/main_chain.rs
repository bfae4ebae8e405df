use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use neo_exporter::constants::GAS_CONTRACT;
use neo_exporter::fetcher::{AlphabetFetcher, BalanceFetcher};
use neo_exporter::{PublicKey, ScriptHash};

use super::{publish_alphabet_keys, Job, Nep17Tracker};
use crate::metrics::Metrics;

pub struct MainChainJobArgs {
    pub metrics: Arc<Metrics>,
    pub alphabet: Arc<dyn AlphabetFetcher>,
    pub balances: Arc<dyn BalanceFetcher>,
    /// NeoFS contract whose GAS holdings are the main chain supply.
    pub neofs: Option<ScriptHash>,
    pub nep17: Option<Nep17Tracker>,
}

/// Main chain scrape: designated alphabet, its GAS balances and the NeoFS
/// contract supply.
pub struct MainChainJob {
    metrics: Arc<Metrics>,
    alphabet: Arc<dyn AlphabetFetcher>,
    balances: Arc<dyn BalanceFetcher>,
    neofs: Option<ScriptHash>,
    nep17: Option<Nep17Tracker>,
}

impl MainChainJob {
    pub fn new(args: MainChainJobArgs) -> Self {
        Self {
            metrics: args.metrics,
            alphabet: args.alphabet,
            balances: args.balances,
            neofs: args.neofs,
            nep17: args.nep17,
        }
    }

    async fn process_alphabet(&self, alphabet: &[PublicKey]) {
        let mut export = HashMap::with_capacity(alphabet.len());
        for key in alphabet {
            let key_hex = key.to_hex();
            match self.balances.fetch(GAS_CONTRACT, key.script_hash()).await {
                Ok(balance) => {
                    export.insert(key_hex, balance);
                }
                Err(e) => tracing::debug!(key = %key_hex, error = %e, "can't fetch gas balance"),
            }
        }

        self.metrics.alphabet_balance.reset();
        for (key, balance) in export {
            self.metrics
                .alphabet_balance
                .with_label_values(&[key.as_str()])
                .set(balance);
        }
    }

    async fn process_supply(&self, neofs: ScriptHash) {
        match self.balances.fetch(GAS_CONTRACT, neofs).await {
            Ok(balance) => self.metrics.main_chain_supply.set(balance),
            Err(e) => tracing::debug!(error = %e, "can't fetch NeoFS contract's GAS balance"),
        }
    }
}

#[async_trait]
impl Job for MainChainJob {
    async fn process(&self) {
        tracing::debug!("retrieving data from main chain");

        match self.alphabet.fetch_alphabet().await {
            Ok(alphabet) => {
                publish_alphabet_keys(&self.metrics, &alphabet);
                self.process_alphabet(&alphabet).await;
            }
            Err(e) => tracing::warn!(error = %e, "can't read NeoFS Alphabet members"),
        }

        if let Some(neofs) = self.neofs {
            self.process_supply(neofs).await;
        }

        if let Some(tracker) = &self.nep17 {
            tracker.process().await;
        }
    }
}
