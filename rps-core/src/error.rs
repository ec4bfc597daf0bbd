use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Wallet not found: {name}")]
    WalletNotFound { name: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn rpc(code: i64, message: impl Into<String>, data: Option<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn wallet(msg: impl Into<String>) -> Self {
        Self::Wallet(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }

    /// Hex payload attached to a JSON-RPC error, usually ABI-encoded revert data.
    pub fn rpc_data(&self) -> Option<&str> {
        match self {
            Self::Rpc { data, .. } => data.as_deref(),
            _ => None,
        }
    }
}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for CoreError {
    fn from(err: dialoguer::Error) -> Self {
        CoreError::Dialog(err.to_string())
    }
}
