//! Capability traits consumed by the monitor jobs.
//!
//! Each trait has one chain-backed implementation in [`crate::contracts`],
//! [`crate::alphabet`] or [`crate::pool`]; jobs only see the traits.

use async_trait::async_trait;

use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;
use crate::locode::Position;
use crate::pool::FanOutPool;
use crate::types::{ContainerInfo, HeightData, NetmapCandidatesInfo, NetmapInfo, StateData};

#[async_trait]
pub trait NetmapFetcher: Send + Sync {
    async fn fetch_netmap(&self) -> Result<NetmapInfo, ExporterError>;

    async fn fetch_candidates(&self) -> Result<NetmapCandidatesInfo, ExporterError>;
}

#[async_trait]
pub trait InnerRingFetcher: Send + Sync {
    async fn fetch_inner_ring_keys(&self) -> Result<Vec<PublicKey>, ExporterError>;
}

#[async_trait]
pub trait AlphabetFetcher: Send + Sync {
    async fn fetch_alphabet(&self) -> Result<Vec<PublicKey>, ExporterError>;
}

/// NEP-17 reads, already scaled by the token decimals.
#[async_trait]
pub trait BalanceFetcher: Send + Sync {
    async fn fetch(&self, token: ScriptHash, account: ScriptHash) -> Result<f64, ExporterError>;

    async fn fetch_total_supply(&self, token: ScriptHash) -> Result<f64, ExporterError>;

    async fn symbol(&self, token: ScriptHash) -> Result<String, ExporterError>;
}

#[async_trait]
pub trait NotaryBalanceFetcher: Send + Sync {
    async fn fetch_notary(&self, account: ScriptHash) -> Result<f64, ExporterError>;
}

#[async_trait]
pub trait ContainerFetcher: Send + Sync {
    async fn total(&self) -> Result<u64, ExporterError>;

    async fn report_summaries(&self) -> Result<Vec<ContainerInfo>, ExporterError>;
}

/// Per-host results; unreachable hosts are left out rather than failing.
#[async_trait]
pub trait HeightFetcher: Send + Sync {
    async fn fetch_height(&self) -> Vec<HeightData>;
}

#[async_trait]
pub trait StateFetcher: Send + Sync {
    async fn fetch_state(&self, height: u32) -> Vec<StateData>;
}

pub trait GeoFetcher: Send + Sync {
    fn get(&self, locode: &str) -> Result<Position, ExporterError>;
}

#[async_trait]
pub trait NnsResolver: Send + Sync {
    /// Resolves a NeoFS system contract (`netmap`, `balance`, ...) by name.
    async fn resolve_fs_contract(&self, name: &str) -> Result<ScriptHash, ExporterError>;
}

#[async_trait]
impl HeightFetcher for FanOutPool {
    async fn fetch_height(&self) -> Vec<HeightData> {
        FanOutPool::fetch_height(self).await
    }
}

#[async_trait]
impl StateFetcher for FanOutPool {
    async fn fetch_state(&self, height: u32) -> Vec<StateData> {
        FanOutPool::fetch_state(self, height).await
    }
}
