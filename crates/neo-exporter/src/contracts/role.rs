use crate::constants::{ROLE_MANAGEMENT_CONTRACT, ROLE_NEOFS_ALPHABET};
use crate::error::ExporterError;
use crate::keys::PublicKey;
use crate::rpc::{ContractParam, RpcClient};

/// Keys designated for `role` at `height` by the native RoleManagement contract.
pub async fn designated_by_role(
    client: &dyn RpcClient,
    role: i64,
    height: u32,
) -> Result<Vec<PublicKey>, ExporterError> {
    let top = client
        .invoke_function(
            ROLE_MANAGEMENT_CONTRACT,
            "getDesignatedByRole",
            vec![
                ContractParam::Integer(role),
                ContractParam::Integer(i64::from(height)),
            ],
        )
        .await?
        .into_top()?;
    top.try_array()?
        .iter()
        .map(|item| PublicKey::from_bytes(item.try_bytes()?))
        .collect()
}

/// NeoFS alphabet designated at the current block count.
pub async fn designated_alphabet(client: &dyn RpcClient) -> Result<Vec<PublicKey>, ExporterError> {
    let height = client.get_block_count().await?;
    designated_by_role(client, ROLE_NEOFS_ALPHABET, height).await
}
