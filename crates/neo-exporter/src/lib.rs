//! Chain access layer of the NeoFS network exporter.
//!
//! Talks to Neo N3 nodes over JSON-RPC and turns contract state into plain
//! values for the monitor:
//!
//! - **Pools** ([`pool::Pool`], [`pool::FanOutPool`]): health-checked failover
//!   over one endpoint, or broadcast to all of them
//! - **Readers** ([`contracts`], [`alphabet`]): netmap, container, NEP-17,
//!   notary and name service contracts behind the [`fetcher`] traits
//! - **Algorithms** ([`diff`]): epoch membership diff and alphabet divergence

// Chain primitives
pub mod constants;
pub mod error;
pub mod hash;
pub mod keys;
pub mod types;

// RPC and connection management
pub mod pool;
pub mod rpc;

// Readers
pub mod alphabet;
pub mod contracts;
pub mod fetcher;
pub mod locode;
pub mod tasks;

pub mod diff;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ExporterError;
pub use hash::ScriptHash;
pub use keys::PublicKey;
pub use pool::{EndpointGroup, FanOutPool, Pool};
pub use rpc::{Dialer, NeoRpcDialer, RpcClient};
