use std::sync::Arc;

use async_trait::async_trait;
use prost::Message;

use super::address::host_without_port;
use super::role::designated_alphabet;
use crate::constants::{ATTR_CAPACITY, ATTR_LOCODE};
use crate::error::ExporterError;
use crate::fetcher::{InnerRingFetcher, NetmapFetcher};
use crate::hash::ScriptHash;
use crate::keys::PublicKey;
use crate::rpc::{RpcClient, StackItem};
use crate::types::{node_id, CandidateNode, NetmapCandidatesInfo, NetmapInfo, Node};

/// Wire form of a storage node descriptor stored in the netmap contract.
#[derive(Clone, PartialEq, Message)]
pub struct NodeInfo {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: Vec<u8>,
    #[prost(string, repeated, tag = "2")]
    pub addresses: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub attributes: Vec<NodeAttribute>,
    #[prost(int32, tag = "4")]
    pub state: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct NodeAttribute {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(string, repeated, tag = "3")]
    pub parents: Vec<String>,
}

/// Reader for the netmap contract.
pub struct NetmapContract {
    client: Arc<dyn RpcClient>,
    hash: ScriptHash,
    notary_enabled: bool,
}

impl NetmapContract {
    /// `notary_enabled` selects how inner ring keys are discovered: through
    /// RoleManagement designation when set, `innerRingList` otherwise.
    pub fn new(client: Arc<dyn RpcClient>, hash: ScriptHash, notary_enabled: bool) -> Self {
        Self {
            client,
            hash,
            notary_enabled,
        }
    }

    pub async fn epoch(&self) -> Result<u64, ExporterError> {
        let top = self
            .client
            .invoke_function(self.hash, "epoch", vec![])
            .await?
            .into_top()?;
        let epoch = top.try_i64()?;
        u64::try_from(epoch).map_err(|_| ExporterError::stack(format!("negative epoch {epoch}")))
    }

    async fn entries(&self, method: &str) -> Result<Vec<StackItem>, ExporterError> {
        let top = self
            .client
            .invoke_function(self.hash, method, vec![])
            .await?
            .into_top()?;
        Ok(top.try_array()?.to_vec())
    }

    async fn inner_ring_list(&self) -> Result<Vec<PublicKey>, ExporterError> {
        self.entries("innerRingList")
            .await?
            .iter()
            .map(parse_ir_node)
            .collect()
    }
}

#[async_trait]
impl NetmapFetcher for NetmapContract {
    async fn fetch_netmap(&self) -> Result<NetmapInfo, ExporterError> {
        let epoch = self
            .epoch()
            .await
            .map_err(|e| ExporterError::Rpc(format!("can't fetch epoch number: {e}")))?;
        let entries = self
            .entries("netmap")
            .await
            .map_err(|e| ExporterError::Rpc(format!("can't fetch network map: {e}")))?;

        let nodes = entries
            .iter()
            .map(|entry| parse_netmap_entry(entry).and_then(|(info, _)| process_node(info)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NetmapInfo { epoch, nodes })
    }

    async fn fetch_candidates(&self) -> Result<NetmapCandidatesInfo, ExporterError> {
        let entries = self
            .entries("netmapCandidates")
            .await
            .map_err(|e| ExporterError::Rpc(format!("can't fetch netmap candidates: {e}")))?;

        let mut nodes = Vec::with_capacity(entries.len());
        for entry in &entries {
            let (info, last_active_epoch) = parse_netmap_entry(entry)?;
            nodes.push(CandidateNode {
                node: process_node(info)?,
                last_active_epoch,
            });
        }
        Ok(NetmapCandidatesInfo { nodes })
    }
}

#[async_trait]
impl InnerRingFetcher for NetmapContract {
    async fn fetch_inner_ring_keys(&self) -> Result<Vec<PublicKey>, ExporterError> {
        let keys = if self.notary_enabled {
            designated_alphabet(self.client.as_ref()).await
        } else {
            self.inner_ring_list().await
        };
        keys.map_err(|e| ExporterError::Rpc(format!("can't fetch inner ring keys: {e}")))
    }
}

/// Splits a contract entry into the node blob and, for candidates, the last
/// active epoch.
///
/// Entries are `Struct[blob, state]` or `Struct[Struct[blob], state, epoch]`.
fn parse_netmap_entry(entry: &StackItem) -> Result<(NodeInfo, Option<u64>), ExporterError> {
    let fields = entry.try_array()?;
    let first = fields
        .first()
        .ok_or_else(|| ExporterError::stack("empty netmap entry"))?;
    let blob = match first {
        StackItem::Struct(inner) | StackItem::Array(inner) => inner
            .first()
            .ok_or_else(|| ExporterError::stack("empty node struct"))?
            .try_bytes()?,
        other => other.try_bytes()?,
    };
    let info = NodeInfo::decode(blob)
        .map_err(|e| ExporterError::stack(format!("can't unmarshal peer info: {e}")))?;

    let last_epoch = match fields.get(2) {
        Some(item) => Some(u64::try_from(item.try_i64()?).map_err(|_| {
            ExporterError::stack("negative candidate epoch".to_string())
        })?),
        None => None,
    };
    Ok((info, last_epoch))
}

fn parse_ir_node(entry: &StackItem) -> Result<PublicKey, ExporterError> {
    let raw = match entry {
        StackItem::Struct(fields) | StackItem::Array(fields) => fields
            .first()
            .ok_or_else(|| ExporterError::stack("empty inner ring node"))?
            .try_bytes()?,
        other => other.try_bytes()?,
    };
    PublicKey::from_bytes(raw)
}

/// Turns a decoded descriptor into a [`Node`]. A bad public key is an error;
/// unparseable addresses are skipped.
pub fn process_node(info: NodeInfo) -> Result<Node, ExporterError> {
    let address = info
        .addresses
        .iter()
        .find_map(|a| match host_without_port(a) {
            Ok(host) => Some(host),
            Err(e) => {
                tracing::debug!(error = %e, "skipping node address");
                None
            }
        })
        .unwrap_or_default();

    let public_key = PublicKey::from_bytes(&info.public_key).map_err(|e| {
        ExporterError::InvalidKey(format!(
            "can't parse storage node public key <{}>: {e}",
            hex::encode(&info.public_key)
        ))
    })?;

    let attributes: std::collections::HashMap<String, String> = info
        .attributes
        .into_iter()
        .map(|a| (a.key, a.value))
        .collect();
    let locode = attributes.get(ATTR_LOCODE).cloned();
    let capacity = attributes
        .get(ATTR_CAPACITY)
        .and_then(|c| c.parse::<u64>().ok());

    Ok(Node {
        id: node_id(&info.public_key),
        address,
        public_key,
        attributes,
        locode,
        capacity,
    })
}
