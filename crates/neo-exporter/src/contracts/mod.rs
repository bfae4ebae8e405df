//! Typed readers over on-chain contracts.

pub mod address;
pub mod container;
pub mod nep17;
pub mod netmap;
pub mod nns;
pub mod notary;
pub mod role;

pub use container::ContainerContract;
pub use nep17::Nep17Contract;
pub use netmap::NetmapContract;
pub use nns::{NnsContract, NnsNoOp};
pub use notary::NotaryContract;

use crate::constants::NOTARY_NATIVE_NAME;
use crate::error::ExporterError;
use crate::rpc::RpcClient;

/// Whether the chain runs the native Notary contract.
pub async fn notary_enabled(client: &dyn RpcClient) -> Result<bool, ExporterError> {
    let natives = client.get_native_contracts().await?;
    Ok(natives
        .iter()
        .any(|c| c.manifest.name == NOTARY_NATIVE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NOTARY_CONTRACT;
    use crate::testing::MockNode;

    #[tokio::test]
    async fn test_notary_detection() {
        let node = MockNode::new("a");
        assert!(!notary_enabled(node.as_ref()).await.unwrap());
        node.add_native("Notary", NOTARY_CONTRACT);
        assert!(notary_enabled(node.as_ref()).await.unwrap());
    }
}
