//! Polling jobs. One iteration reads chain state through the fetcher traits
//! and republishes it on the [`Metrics`] gauges.

mod fs_chain;
mod main_chain;
mod nep17_tracker;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use neo_exporter::PublicKey;

use crate::metrics::Metrics;

pub use fs_chain::{FsChainJob, FsChainJobArgs};
pub use main_chain::{MainChainJob, MainChainJobArgs};
pub use nep17_tracker::Nep17Tracker;

/// One scrape of a chain. Steps fail independently and only log.
#[async_trait]
pub trait Job: Send + Sync {
    async fn process(&self);
}

/// Replaces the `alphabet_public_key` series with the given keys.
fn publish_alphabet_keys(metrics: &Metrics, alphabet: &[PublicKey]) {
    metrics.alphabet_public_key.reset();
    for key in alphabet {
        metrics
            .alphabet_public_key
            .with_label_values(&[key.to_hex().as_str()])
            .set(1.0);
    }
}
