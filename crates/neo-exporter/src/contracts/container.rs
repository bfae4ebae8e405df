use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::ITERATOR_PAGE_SIZE;
use crate::error::ExporterError;
use crate::fetcher::ContainerFetcher;
use crate::hash::ScriptHash;
use crate::rpc::{RpcClient, StackItem};
use crate::types::ContainerInfo;

const CONTAINER_ID_LEN: usize = 32;

/// Reader for the container contract.
pub struct ContainerContract {
    client: Arc<dyn RpcClient>,
    hash: ScriptHash,
}

impl ContainerContract {
    pub fn new(client: Arc<dyn RpcClient>, hash: ScriptHash) -> Self {
        Self { client, hash }
    }
}

#[async_trait]
impl ContainerFetcher for ContainerContract {
    async fn total(&self) -> Result<u64, ExporterError> {
        let count = self
            .client
            .invoke_function(self.hash, "count", vec![])
            .await?
            .into_top()?
            .try_i64()?;
        u64::try_from(count).map_err(|_| ExporterError::stack(format!("negative count {count}")))
    }

    async fn report_summaries(&self) -> Result<Vec<ContainerInfo>, ExporterError> {
        let items = self
            .client
            .invoke_and_traverse(
                self.hash,
                "iterateAllReportSummaries",
                vec![],
                ITERATOR_PAGE_SIZE,
            )
            .await
            .map_err(|e| ExporterError::Rpc(format!("can't iterate report summaries: {e}")))?;
        items.iter().map(parse_summary).collect()
    }
}

/// `Struct[cid, Struct[size, objects]]`
fn parse_summary(item: &StackItem) -> Result<ContainerInfo, ExporterError> {
    let kv = item.try_array()?;
    let (cid, summary) = match kv {
        [cid, summary, ..] => (cid.try_bytes()?, summary.try_array()?),
        _ => return Err(ExporterError::stack("malformed report summary")),
    };
    if cid.len() != CONTAINER_ID_LEN {
        return Err(ExporterError::stack(format!(
            "container id of {} bytes",
            cid.len()
        )));
    }
    let (size, objects) = match summary {
        [size, objects, ..] => (size.try_i64()?, objects.try_i64()?),
        _ => return Err(ExporterError::stack("malformed container summary")),
    };
    Ok(ContainerInfo {
        id: bs58::encode(cid).into_string(),
        size: u64::try_from(size).unwrap_or_default(),
        objects: u64::try_from(objects).unwrap_or_default(),
    })
}
