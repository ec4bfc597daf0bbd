use crate::error::{CoreError, Result};
use crate::rpc::RpcClient;
use crate::types::{ConnectorKind, TxRequest};
use crate::wallet::WalletConnector;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;

/// Connector for accounts whose keys live behind the RPC endpoint, the way an
/// injected browser wallet holds them. The endpoint signs via `eth_sendTransaction`.
#[derive(Debug, Clone, Default)]
pub struct NodeConnector {
    pinned: Option<Address>,
}

impl NodeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific endpoint account instead of the first one offered
    pub fn pinned(account: Address) -> Self {
        Self {
            pinned: Some(account),
        }
    }
}

#[async_trait]
impl WalletConnector for NodeConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Injected
    }

    async fn account(&self, rpc: &RpcClient) -> Result<Address> {
        let accounts = match rpc.request_accounts().await {
            Ok(accounts) if !accounts.is_empty() => accounts,
            Ok(_) => rpc.accounts().await?,
            Err(e) => {
                // plain nodes do not implement the wallet permission method
                tracing::debug!("eth_requestAccounts unavailable ({}), using eth_accounts", e);
                rpc.accounts().await?
            }
        };

        select_account(&accounts, self.pinned)
    }

    async fn send_transaction(&self, rpc: &RpcClient, request: TxRequest) -> Result<B256> {
        let from = self.account(rpc).await?;
        let tx_hash = rpc.send_transaction(&request.from(from)).await?;

        tracing::info!("Endpoint account {} sent transaction {}", from, tx_hash);
        Ok(tx_hash)
    }
}

fn select_account(accounts: &[Address], pinned: Option<Address>) -> Result<Address> {
    match pinned {
        Some(account) => accounts
            .iter()
            .copied()
            .find(|a| *a == account)
            .ok_or_else(|| {
                CoreError::wallet(format!("Account {} is not managed by the endpoint", account))
            }),
        None => accounts
            .first()
            .copied()
            .ok_or_else(|| CoreError::wallet("Endpoint exposes no accounts")),
    }
}
