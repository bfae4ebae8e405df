use std::sync::Arc;

use alloy::primitives::I256;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::ExporterError;
use crate::fetcher::BalanceFetcher;
use crate::hash::ScriptHash;
use crate::rpc::{ContractParam, RpcClient};

/// Converts a raw token amount into whole units.
pub fn scale_amount(amount: I256, decimals: u32) -> f64 {
    let raw = amount.to_string().parse::<f64>().unwrap_or_default();
    raw / 10f64.powi(decimals as i32)
}

/// NEP-17 reader. Token decimals are fetched once per contract and cached
/// for the life of the reader.
pub struct Nep17Contract {
    client: Arc<dyn RpcClient>,
    decimals: DashMap<ScriptHash, u32>,
}

impl Nep17Contract {
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self {
            client,
            decimals: DashMap::new(),
        }
    }

    async fn decimals(&self, token: ScriptHash) -> Result<u32, ExporterError> {
        if let Some(d) = self.decimals.get(&token) {
            return Ok(*d);
        }
        let raw = self
            .client
            .invoke_function(token, "decimals", vec![])
            .await?
            .into_top()?
            .try_i64()?;
        let decimals = u32::try_from(raw)
            .map_err(|_| ExporterError::stack(format!("invalid decimals {raw} of {token}")))?;
        self.decimals.insert(token, decimals);
        Ok(decimals)
    }

    async fn read_amount(
        &self,
        token: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
    ) -> Result<f64, ExporterError> {
        let amount = self
            .client
            .invoke_function(token, method, params)
            .await?
            .into_top()?
            .try_integer()?;
        let decimals = self.decimals(token).await?;
        Ok(scale_amount(amount, decimals))
    }
}

#[async_trait]
impl BalanceFetcher for Nep17Contract {
    async fn fetch(&self, token: ScriptHash, account: ScriptHash) -> Result<f64, ExporterError> {
        self.read_amount(token, "balanceOf", vec![ContractParam::Hash160(account)])
            .await
    }

    async fn fetch_total_supply(&self, token: ScriptHash) -> Result<f64, ExporterError> {
        self.read_amount(token, "totalSupply", vec![]).await
    }

    async fn symbol(&self, token: ScriptHash) -> Result<String, ExporterError> {
        self.client
            .invoke_function(token, "symbol", vec![])
            .await?
            .into_top()?
            .try_utf8()
    }
}
