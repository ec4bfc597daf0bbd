use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Transaction or call request as sent over JSON-RPC
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
}

impl TxRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U256>,
    #[serde(default)]
    pub status: Option<U256>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status; those are treated as successful
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U256::from(1))
    }

    pub fn logs_from(&self, address: Address) -> impl Iterator<Item = &Log> {
        self.logs.iter().filter(move |log| log.address == address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Keys held by the endpoint, like an injected browser wallet
    Injected,
    /// Mnemonic kept in the local keystore
    Local,
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorKind::Injected => write!(f, "injected"),
            ConnectorKind::Local => write!(f, "local"),
        }
    }
}
