use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::keys::PublicKey;

/// A storage node as declared in the network map.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identifier derived from the public key; join key for diffs.
    pub id: u64,
    /// Host part of the first announced address that parses.
    pub address: String,
    pub public_key: PublicKey,
    pub attributes: HashMap<String, String>,
    pub locode: Option<String>,
    /// Declared capacity in GB.
    pub capacity: Option<u64>,
}

/// 64-bit node identifier: leading eight bytes of SHA-256 over the key bytes.
pub fn node_id(raw_key: &[u8]) -> u64 {
    let digest = Sha256::digest(raw_key);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetmapInfo {
    pub epoch: u64,
    pub nodes: Vec<Node>,
}

/// Node proposed for the next epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateNode {
    pub node: Node,
    /// Last epoch the node refreshed its candidacy, when the contract reports it.
    pub last_active_epoch: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetmapCandidatesInfo {
    pub nodes: Vec<CandidateNode>,
}

impl NetmapCandidatesInfo {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|c| &c.node)
    }
}

/// Per-host state height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightData {
    pub host: String,
    pub value: u32,
}

/// Per-host state root hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateData {
    pub host: String,
    pub value: String,
}

/// Storage usage reported for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Base58 container ID.
    pub id: String,
    pub size: u64,
    pub objects: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_is_stable_and_key_dependent() {
        assert_eq!(node_id(b"key-1"), node_id(b"key-1"));
        assert_ne!(node_id(b"key-1"), node_id(b"key-2"));
    }
}
