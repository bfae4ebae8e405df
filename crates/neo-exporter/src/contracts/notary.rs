use std::sync::Arc;

use async_trait::async_trait;

use super::nep17::scale_amount;
use crate::constants::{NOTARY_CONTRACT, NOTARY_DECIMALS};
use crate::error::ExporterError;
use crate::fetcher::NotaryBalanceFetcher;
use crate::hash::ScriptHash;
use crate::rpc::{ContractParam, RpcClient};

/// GAS deposited to the native Notary contract.
pub struct NotaryContract {
    client: Arc<dyn RpcClient>,
}

impl NotaryContract {
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotaryBalanceFetcher for NotaryContract {
    async fn fetch_notary(&self, account: ScriptHash) -> Result<f64, ExporterError> {
        let amount = self
            .client
            .invoke_function(
                NOTARY_CONTRACT,
                "balanceOf",
                vec![ContractParam::Hash160(account)],
            )
            .await?
            .into_top()?
            .try_integer()?;
        Ok(scale_amount(amount, NOTARY_DECIMALS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::StackItem;
    use crate::testing::MockNode;
    use alloy::primitives::I256;

    #[tokio::test]
    async fn test_notary_uses_fixed_decimals() {
        let node = MockNode::new("a");
        node.on_invoke(
            "balanceOf",
            vec![StackItem::Integer(I256::try_from(50_000_000i64).unwrap())],
        );
        let notary = NotaryContract::new(node.clone());
        assert_eq!(notary.fetch_notary(ScriptHash::default()).await.unwrap(), 0.5);
        assert_eq!(node.calls()[0].0, NOTARY_CONTRACT);
    }
}
