use std::sync::Arc;

use neo_exporter::fetcher::BalanceFetcher;
use neo_exporter::tasks::Item;

use crate::metrics::Metrics;

/// Publishes balances and total supplies for the configured NEP-17 tasks.
pub struct Nep17Tracker {
    balances: Arc<dyn BalanceFetcher>,
    tasks: Vec<Item>,
    metrics: Arc<Metrics>,
}

impl Nep17Tracker {
    pub fn new(
        balances: Arc<dyn BalanceFetcher>,
        tasks: Vec<Item>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            balances,
            tasks,
            metrics,
        }
    }

    pub fn tasks(&self) -> &[Item] {
        &self.tasks
    }

    pub async fn process(&self) {
        for item in &self.tasks {
            let contract = item.hash.to_string();

            for account in &item.accounts {
                let address = account.to_address();
                match self.balances.fetch(item.hash, *account).await {
                    Ok(balance) => self
                        .metrics
                        .nep17_balance
                        .with_label_values(&[
                            item.label.as_str(),
                            item.symbol.as_str(),
                            contract.as_str(),
                            address.as_str(),
                        ])
                        .set(balance),
                    Err(e) => {
                        tracing::error!(contract = %contract, account = %address, error = %e, "nep17 balance");
                    }
                }
            }

            if item.total {
                match self.balances.fetch_total_supply(item.hash).await {
                    Ok(supply) => self
                        .metrics
                        .nep17_total_supply
                        .with_label_values(&[
                            item.label.as_str(),
                            item.symbol.as_str(),
                            contract.as_str(),
                        ])
                        .set(supply),
                    Err(e) => {
                        tracing::error!(contract = %contract, error = %e, "nep17 total supply");
                    }
                }
            }
        }
    }
}
