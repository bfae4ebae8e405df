use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::EndpointGroup;
use crate::error::ExporterError;
use crate::rpc::RpcClient;
use crate::types::{HeightData, StateData};

/// One client per endpoint; height and state queries go to all of them.
pub struct FanOutPool {
    group: EndpointGroup,
    clients: RwLock<Vec<Option<Arc<dyn RpcClient>>>>,
}

impl FanOutPool {
    /// Dials every endpoint; any failure aborts construction.
    pub async fn connect(group: EndpointGroup) -> Result<Self, ExporterError> {
        let dials = join_all((0..group.len()).map(|i| group.dial(i))).await;
        let mut clients = Vec::with_capacity(dials.len());
        for (endpoint, dial) in group.endpoints().iter().zip(dials) {
            let client = dial.map_err(|e| {
                ExporterError::Rpc(format!("can't dial {endpoint}: {e}"))
            })?;
            clients.push(Some(client));
        }
        Ok(Self {
            group,
            clients: RwLock::new(clients),
        })
    }

    pub fn endpoints(&self) -> &[String] {
        self.group.endpoints()
    }

    async fn live_clients(&self) -> Vec<(String, Arc<dyn RpcClient>)> {
        let clients = self.clients.read().await;
        self.group
            .endpoints()
            .iter()
            .zip(clients.iter())
            .filter_map(|(ep, c)| c.as_ref().map(|c| (ep.clone(), Arc::clone(c))))
            .collect()
    }

    /// Locally known state height of every reachable host.
    pub async fn fetch_height(&self) -> Vec<HeightData> {
        let clients = self.live_clients().await;
        let results = join_all(clients.into_iter().map(|(host, client)| async move {
            match client.get_state_height().await {
                Ok(h) => Some(HeightData {
                    host,
                    value: h.local,
                }),
                Err(e) => {
                    tracing::warn!(host = %host, error = %e, "failed to fetch state height");
                    None
                }
            }
        }))
        .await;
        results.into_iter().flatten().collect()
    }

    /// State root hash at `height` of every reachable host.
    pub async fn fetch_state(&self, height: u32) -> Vec<StateData> {
        let clients = self.live_clients().await;
        let results = join_all(clients.into_iter().map(|(host, client)| async move {
            match client.get_state_root(height).await {
                Ok(root) => Some(StateData {
                    host,
                    value: root.to_string(),
                }),
                Err(e) => {
                    tracing::warn!(host = %host, height, error = %e, "failed to fetch state root");
                    None
                }
            }
        }))
        .await;
        results.into_iter().flatten().collect()
    }

    /// Probes every client and redials the ones that stopped answering.
    /// Hosts that still fail stay excluded until the next recheck.
    pub async fn recheck(&self) {
        let snapshot = self.clients.read().await.clone();
        let probes = join_all(snapshot.iter().enumerate().map(|(i, c)| async move {
            if let Some(c) = c {
                if c.get_block_count().await.is_ok() {
                    return None;
                }
            }
            Some((i, self.group.dial(i).await))
        }))
        .await;

        let mut clients = self.clients.write().await;
        for (i, dial) in probes.into_iter().flatten() {
            let endpoint = &self.group.endpoints()[i];
            match dial {
                Ok(client) => {
                    tracing::info!(endpoint = %endpoint, "redialed rpc endpoint");
                    clients[i] = Some(client);
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "rpc endpoint is unreachable");
                    clients[i] = None;
                }
            }
        }
    }

    /// Runs [`FanOutPool::recheck`] every `period` until `cancel` fires.
    pub fn start_recheck(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = interval.tick() => pool.recheck().await,
                }
            }
        })
    }
}
