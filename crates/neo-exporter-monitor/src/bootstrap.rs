//! Builds a ready-to-run [`Monitor`] from configuration.
//!
//! Dials the RPC pools, resolves contract hashes (config first, NNS second),
//! constructs the readers and the job for the selected chain. Every failure
//! here is fatal for the process.

use std::sync::Arc;

use neo_exporter::alphabet::{CommitteeAlphabet, DesignatedAlphabet};
use neo_exporter::contracts::{
    notary_enabled, ContainerContract, Nep17Contract, NetmapContract, NnsContract, NnsNoOp,
    NotaryContract,
};
use neo_exporter::fetcher::{AlphabetFetcher, BalanceFetcher, GeoFetcher, NnsResolver};
use neo_exporter::locode::LocodeDb;
use neo_exporter::tasks::parse_nep17_tasks;
use neo_exporter::{
    EndpointGroup, ExporterError, FanOutPool, NeoRpcDialer, Pool, RpcClient, ScriptHash,
};
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, MonitorConfig, RpcConfig};
use crate::job::{FsChainJob, FsChainJobArgs, Job, MainChainJob, MainChainJobArgs, Nep17Tracker};
use crate::metrics::{ChainMode, Metrics};
use crate::monitor::Monitor;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("chain access: {0}")]
    Chain(#[from] ExporterError),

    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("can't resolve {name} contract: {reason}")]
    Contract { name: &'static str, reason: String },
}

/// Connects everything and returns the monitor. Background pool tasks stop
/// when `cancel` fires.
pub async fn build(
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> Result<Monitor, BootstrapError> {
    let mode = if config.chain.fschain {
        ChainMode::FsChain
    } else {
        ChainMode::MainChain
    };
    let metrics = Arc::new(Metrics::new(mode)?);
    metrics.set_version(env!("CARGO_PKG_VERSION"));

    let pool = connect_pool(&config.chain.rpc, cancel).await?;
    let job: Arc<dyn Job> = match mode {
        ChainMode::FsChain => Arc::new(build_fs_chain_job(config, pool, &metrics, cancel).await?),
        ChainMode::MainChain => Arc::new(build_main_chain_job(config, pool, &metrics).await?),
    };

    Ok(Monitor::new(
        job,
        metrics,
        config.metrics.interval,
        config.listen_addr()?,
    ))
}

async fn connect_pool(
    rpc: &RpcConfig,
    cancel: &CancellationToken,
) -> Result<Arc<Pool>, BootstrapError> {
    let dialer = Arc::new(NeoRpcDialer::new(rpc.dial_timeout));
    let group = EndpointGroup::new(rpc.endpoint.clone(), dialer)?;
    let pool = Arc::new(Pool::connect(group, rpc.health_recheck_interval).await?);
    pool.start_health_recheck(cancel.child_token());
    Ok(pool)
}

async fn build_fs_chain_job(
    config: &MonitorConfig,
    pool: Arc<Pool>,
    metrics: &Arc<Metrics>,
    cancel: &CancellationToken,
) -> Result<FsChainJob, BootstrapError> {
    let client: Arc<dyn RpcClient> = pool;

    let notary = notary_enabled(client.as_ref()).await?;
    tracing::info!(notary_enabled = notary, "FS chain notary detection");

    let nns: Arc<dyn NnsResolver> = match NnsContract::infer(Arc::clone(&client)).await {
        Ok(nns) => {
            tracing::info!(hash = %nns.hash(), "NNS contract found");
            Arc::new(nns)
        }
        Err(e) => {
            tracing::warn!(error = %e, "NNS contract is unavailable, only configured contract hashes can be used");
            Arc::new(NnsNoOp)
        }
    };

    let contracts = &config.contracts;
    let netmap_hash = contract_hash("netmap", contracts.netmap.as_deref(), nns.as_ref()).await?;
    let container_hash =
        contract_hash("container", contracts.container.as_deref(), nns.as_ref()).await?;
    let balance_hash = contract_hash("balance", contracts.balance.as_deref(), nns.as_ref()).await?;
    let proxy = proxy_hash(contracts.proxy.as_deref(), nns.as_ref()).await?;
    tracing::info!(
        netmap = %netmap_hash,
        container = %container_hash,
        balance = %balance_hash,
        "NeoFS contracts resolved"
    );

    let netmap = Arc::new(NetmapContract::new(Arc::clone(&client), netmap_hash, notary));
    let balances: Arc<dyn BalanceFetcher> = Arc::new(Nep17Contract::new(Arc::clone(&client)));

    let fan_out_group = EndpointGroup::new(
        config.chain.rpc.endpoint.clone(),
        Arc::new(NeoRpcDialer::new(config.chain.rpc.dial_timeout)),
    )?;
    let fan_out = Arc::new(FanOutPool::connect(fan_out_group).await?);
    fan_out.start_recheck(config.metrics.interval, cancel.child_token());

    let main_alphabet: Option<Arc<dyn AlphabetFetcher>> = match config.main_chain_endpoints() {
        Some(_) => {
            let main_rpc = config
                .mainnet
                .as_ref()
                .map(|m| &m.rpc)
                .ok_or(ConfigError::MissingRequired("mainnet.rpc"))?;
            let main_pool = connect_pool(main_rpc, cancel).await?;
            Some(Arc::new(DesignatedAlphabet::new(main_pool)))
        }
        None => {
            tracing::info!("main chain endpoints not configured, alphabet divergence disabled");
            None
        }
    };

    let geo: Option<Arc<dyn GeoFetcher>> = match &config.locode.db.path {
        Some(path) => {
            let db = LocodeDb::open(path)?;
            tracing::info!(path = %path.display(), records = db.len(), "locode database loaded");
            Some(Arc::new(db))
        }
        None => {
            tracing::info!("locode database not configured, node locations disabled");
            None
        }
    };

    let nep17 = nep17_tracker(config, &balances, nns.as_ref(), metrics).await?;

    Ok(FsChainJob::new(FsChainJobArgs {
        metrics: Arc::clone(metrics),
        balance: balance_hash,
        proxy,
        netmap: netmap.clone(),
        inner_ring: netmap,
        alphabet: Arc::new(CommitteeAlphabet::new(Arc::clone(&client))),
        main_alphabet,
        balances,
        notary: Arc::new(NotaryContract::new(Arc::clone(&client))),
        containers: Arc::new(ContainerContract::new(Arc::clone(&client), container_hash)),
        heights: fan_out.clone(),
        states: fan_out,
        geo,
        nep17,
    }))
}

async fn build_main_chain_job(
    config: &MonitorConfig,
    pool: Arc<Pool>,
    metrics: &Arc<Metrics>,
) -> Result<MainChainJob, BootstrapError> {
    let client: Arc<dyn RpcClient> = pool;

    let neofs = match config.contracts.neofs.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<ScriptHash>().map_err(|e| BootstrapError::Contract {
            name: "neofs",
            reason: e.to_string(),
        })?),
        None => {
            tracing::info!("NeoFS contract address not configured");
            None
        }
    };

    let balances: Arc<dyn BalanceFetcher> = Arc::new(Nep17Contract::new(Arc::clone(&client)));
    let nep17 = nep17_tracker(config, &balances, &NnsNoOp, metrics).await?;

    Ok(MainChainJob::new(MainChainJobArgs {
        metrics: Arc::clone(metrics),
        alphabet: Arc::new(DesignatedAlphabet::new(client)),
        balances,
        neofs,
        nep17,
    }))
}

/// Configured hash when present, NNS lookup of `name` otherwise.
async fn contract_hash(
    name: &'static str,
    configured: Option<&str>,
    nns: &dyn NnsResolver,
) -> Result<ScriptHash, BootstrapError> {
    let resolved = match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<ScriptHash>(),
        None => nns.resolve_fs_contract(name).await,
    };
    resolved.map_err(|e| BootstrapError::Contract {
        name,
        reason: e.to_string(),
    })
}

/// Proxy is optional: a configured hash must parse, an NNS miss disables it.
async fn proxy_hash(
    configured: Option<&str>,
    nns: &dyn NnsResolver,
) -> Result<Option<ScriptHash>, BootstrapError> {
    if configured.map(str::trim).is_some_and(|s| !s.is_empty()) {
        return contract_hash("proxy", configured, nns).await.map(Some);
    }
    match nns.resolve_fs_contract("proxy").await {
        Ok(hash) => Ok(Some(hash)),
        Err(e) => {
            tracing::info!(error = %e, "proxy disabled");
            Ok(None)
        }
    }
}

async fn nep17_tracker(
    config: &MonitorConfig,
    balances: &Arc<dyn BalanceFetcher>,
    nns: &dyn NnsResolver,
    metrics: &Arc<Metrics>,
) -> Result<Option<Nep17Tracker>, BootstrapError> {
    if config.nep17.is_empty() {
        return Ok(None);
    }
    let tasks = parse_nep17_tasks(balances.as_ref(), &config.nep17, nns).await?;
    tracing::info!(tasks = tasks.len(), "nep17 tracker configured");
    Ok(Some(Nep17Tracker::new(
        Arc::clone(balances),
        tasks,
        Arc::clone(metrics),
    )))
}
