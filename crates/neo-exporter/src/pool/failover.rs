use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::B256;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::EndpointGroup;
use crate::constants::DEFAULT_RECHECK_INTERVAL;
use crate::error::ExporterError;
use crate::hash::ScriptHash;
use crate::keys::PublicKey;
use crate::rpc::{
    ContractParam, ContractState, InvokeResult, NodeVersion, RpcClient, StackItem, StateHeight,
};

struct PoolState {
    next: usize,
    client: Option<Arc<dyn RpcClient>>,
    /// Bumped on every successful reconnect.
    generation: u64,
}

/// Single live connection to one of several endpoints with lazy health
/// probing and round-robin failover.
///
/// Liveness is trusted for `recheck_interval` after a successful probe. Past
/// that, the next caller probes with `getblockcount`; a failed probe swaps the
/// connection under the write lock, so borrowers never see a torn-down client.
/// Errors from the requested call itself are returned as is and not retried.
pub struct Pool {
    group: EndpointGroup,
    state: RwLock<PoolState>,
    /// Endpoint index of the live connection, readable without the lock.
    current: AtomicUsize,
    origin: Instant,
    /// Nanoseconds since `origin` of the last good probe, offset by one; zero
    /// means never.
    last_healthy: AtomicU64,
    recheck_interval: Duration,
}

impl Pool {
    /// Connects to the first endpoint that answers, trying each once in order.
    /// A zero `recheck_interval` selects the default.
    pub async fn connect(
        group: EndpointGroup,
        recheck_interval: Duration,
    ) -> Result<Self, ExporterError> {
        let recheck_interval = if recheck_interval.is_zero() {
            DEFAULT_RECHECK_INTERVAL
        } else {
            recheck_interval
        };
        let (index, client) = group
            .dial_from(0)
            .await
            .ok_or(ExporterError::NoHealthyClient)?;
        tracing::info!(endpoint = %group.endpoints()[index], "rpc pool connected");

        let pool = Self {
            state: RwLock::new(PoolState {
                next: (index + 1) % group.len(),
                client: Some(client),
                generation: 0,
            }),
            group,
            current: AtomicUsize::new(index),
            origin: Instant::now(),
            last_healthy: AtomicU64::new(0),
            recheck_interval,
        };
        pool.mark_healthy();
        Ok(pool)
    }

    pub fn endpoints(&self) -> &[String] {
        self.group.endpoints()
    }

    pub fn recheck_interval(&self) -> Duration {
        self.recheck_interval
    }

    /// Index of the endpoint currently in use.
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    fn mark_healthy(&self) {
        let elapsed = self.origin.elapsed().as_nanos() as u64;
        self.last_healthy.store(elapsed + 1, Ordering::Release);
    }

    fn is_fresh(&self) -> bool {
        let stamp = self.last_healthy.load(Ordering::Acquire);
        if stamp == 0 {
            return false;
        }
        let now = self.origin.elapsed().as_nanos() as u64 + 1;
        Duration::from_nanos(now.saturating_sub(stamp)) < self.recheck_interval
    }

    /// Client to run one call on, after the liveness pre-flight.
    pub async fn connection(&self) -> Result<Arc<dyn RpcClient>, ExporterError> {
        let (client, generation) = {
            let state = self.state.read().await;
            (state.client.clone(), state.generation)
        };

        if let Some(client) = client {
            if self.is_fresh() {
                return Ok(client);
            }
            match client.get_block_count().await {
                Ok(_) => {
                    self.mark_healthy();
                    return Ok(client);
                }
                Err(e) => {
                    tracing::warn!(endpoint = %client.endpoint(), error = %e, "rpc endpoint failed liveness probe");
                }
            }
        }

        self.reconnect(generation).await
    }

    /// Probes the current connection regardless of freshness.
    pub async fn recheck(&self) -> Result<(), ExporterError> {
        let (client, generation) = {
            let state = self.state.read().await;
            (state.client.clone(), state.generation)
        };
        if let Some(client) = client {
            match client.get_block_count().await {
                Ok(_) => {
                    self.mark_healthy();
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(endpoint = %client.endpoint(), error = %e, "rpc endpoint failed health recheck");
                }
            }
        }
        self.reconnect(generation).await.map(|_| ())
    }

    async fn reconnect(&self, observed: u64) -> Result<Arc<dyn RpcClient>, ExporterError> {
        let mut state = self.state.write().await;

        // Someone else already replaced the connection we saw failing.
        if state.generation != observed {
            if let Some(client) = &state.client {
                return Ok(Arc::clone(client));
            }
        }

        state.client = None;
        match self.group.dial_from(state.next).await {
            Some((index, client)) => {
                self.current.store(index, Ordering::Release);
                state.next = (index + 1) % self.group.len();
                state.client = Some(Arc::clone(&client));
                state.generation += 1;
                self.mark_healthy();
                tracing::info!(endpoint = %self.group.endpoints()[index], "rpc pool switched endpoint");
                Ok(client)
            }
            None => {
                tracing::warn!("no healthy rpc endpoint available");
                Err(ExporterError::NoHealthyClient)
            }
        }
    }

    /// Spawns a task re-probing the connection every recheck interval until
    /// `cancel` fires.
    pub fn start_health_recheck(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(pool.recheck_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately and the pool was just dialed.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = interval.tick() => {}
                }
                if let Err(e) = pool.recheck().await {
                    tracing::warn!(error = %e, "pool health recheck failed");
                }
            }
        })
    }
}

#[async_trait]
impl RpcClient for Pool {
    fn endpoint(&self) -> String {
        self.group.endpoints()[self.current_index()].clone()
    }

    async fn get_version(&self) -> Result<NodeVersion, ExporterError> {
        self.connection().await?.get_version().await
    }

    async fn get_block_count(&self) -> Result<u32, ExporterError> {
        self.connection().await?.get_block_count().await
    }

    async fn get_committee(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.connection().await?.get_committee().await
    }

    async fn get_native_contracts(&self) -> Result<Vec<ContractState>, ExporterError> {
        self.connection().await?.get_native_contracts().await
    }

    async fn get_contract_state_by_id(&self, id: i32) -> Result<ContractState, ExporterError> {
        self.connection().await?.get_contract_state_by_id(id).await
    }

    async fn invoke_function(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
    ) -> Result<InvokeResult, ExporterError> {
        self.connection()
            .await?
            .invoke_function(contract, method, params)
            .await
    }

    async fn invoke_and_traverse(
        &self,
        contract: ScriptHash,
        method: &str,
        params: Vec<ContractParam>,
        page_size: u32,
    ) -> Result<Vec<StackItem>, ExporterError> {
        self.connection()
            .await?
            .invoke_and_traverse(contract, method, params, page_size)
            .await
    }

    async fn get_state_height(&self) -> Result<StateHeight, ExporterError> {
        self.connection().await?.get_state_height().await
    }

    async fn get_state_root(&self, height: u32) -> Result<B256, ExporterError> {
        self.connection().await?.get_state_root(height).await
    }
}
