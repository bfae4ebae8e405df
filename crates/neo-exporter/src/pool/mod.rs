//! Endpoint groups and the two connection strategies built on them.
//!
//! - [`Pool`] selects one live endpoint and fails over round-robin.
//! - [`FanOutPool`] keeps a client per endpoint and broadcasts queries.

mod failover;
mod fanout;

use std::sync::Arc;

use crate::error::ExporterError;
use crate::rpc::{Dialer, RpcClient};

pub use failover::Pool;
pub use fanout::FanOutPool;

/// Ordered, immutable set of endpoints sharing one dialer.
#[derive(Clone)]
pub struct EndpointGroup {
    endpoints: Vec<String>,
    dialer: Arc<dyn Dialer>,
}

impl EndpointGroup {
    pub fn new(endpoints: Vec<String>, dialer: Arc<dyn Dialer>) -> Result<Self, ExporterError> {
        if endpoints.is_empty() {
            return Err(ExporterError::ConfigError(
                "at least one rpc endpoint is required".to_string(),
            ));
        }
        Ok(Self { endpoints, dialer })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub async fn dial(&self, index: usize) -> Result<Arc<dyn RpcClient>, ExporterError> {
        let endpoint = &self.endpoints[index % self.endpoints.len()];
        self.dialer.dial(endpoint).await
    }

    /// Tries every endpoint once starting at `start`, wrapping around.
    /// Returns the index and client of the first one that dials.
    pub async fn dial_from(&self, start: usize) -> Option<(usize, Arc<dyn RpcClient>)> {
        let n = self.endpoints.len();
        for i in start..start + n {
            let index = i % n;
            match self.dial(index).await {
                Ok(client) => return Some((index, client)),
                Err(e) => {
                    tracing::warn!(endpoint = %self.endpoints[index], error = %e, "failed to dial rpc endpoint");
                }
            }
        }
        None
    }
}
