//! Declarative NEP-17 tracking tasks.

use serde::Deserialize;

use crate::constants::{GAS_CONTRACT, NEO_CONTRACT};
use crate::error::ExporterError;
use crate::fetcher::{BalanceFetcher, NnsResolver};
use crate::hash::ScriptHash;

/// One `nep17` config entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nep17Balance {
    /// `NEO`, `GAS`, a NeoFS contract name, a hex script hash or an address.
    pub contract: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub total_supply: bool,
    #[serde(default)]
    pub balance_of: Vec<String>,
}

/// A resolved tracking task.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub symbol: String,
    pub hash: ScriptHash,
    pub accounts: Vec<ScriptHash>,
    pub total: bool,
    pub label: String,
}

async fn resolve_contract(
    name: &str,
    nns: &dyn NnsResolver,
) -> Result<ScriptHash, ExporterError> {
    match name {
        "NEO" | "neo" => return Ok(NEO_CONTRACT),
        "GAS" | "gas" => return Ok(GAS_CONTRACT),
        _ => {}
    }
    if let Ok(hash) = nns.resolve_fs_contract(name).await {
        return Ok(hash);
    }
    name.parse::<ScriptHash>()
        .map_err(|e| ExporterError::ConfigError(format!("nep17 contract {name} is invalid: {e}")))
}

/// Resolves config entries into tasks.
///
/// An unresolvable contract or a symbol that can't be read fails the whole
/// parse; a malformed account is logged and skipped.
pub async fn parse_nep17_tasks(
    balances: &dyn BalanceFetcher,
    items: &[Nep17Balance],
    nns: &dyn NnsResolver,
) -> Result<Vec<Item>, ExporterError> {
    let mut tasks = Vec::with_capacity(items.len());
    for it in items {
        let hash = resolve_contract(&it.contract, nns).await?;
        let symbol = balances.symbol(hash).await.map_err(|e| {
            ExporterError::Rpc(format!("nep17 contract {} symbol: {e}", it.contract))
        })?;

        let mut accounts = Vec::with_capacity(it.balance_of.len());
        for account in &it.balance_of {
            match account.parse::<ScriptHash>() {
                Ok(acc) => accounts.push(acc),
                Err(e) => {
                    tracing::error!(contract = %hash, balance_of = %account, error = %e, "parse nep17 account");
                }
            }
        }

        tasks.push(Item {
            symbol,
            hash,
            accounts,
            total: it.total_supply,
            label: it.label.clone(),
        });
    }
    Ok(tasks)
}
