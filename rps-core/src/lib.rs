//! rps-core - RPC, wallet and storage layer for the on-chain Rock-Paper-Scissors client
//!
//! This crate knows nothing about the game itself. It provides a JSON-RPC client,
//! wallet connectors (endpoint-managed and local keystore), network configuration
//! and the SQLite storage that keeps wallets and move secrets.

pub mod config;
pub mod error;
pub mod rpc;
pub mod storage;
pub mod types;
pub mod wallet;

pub use config::NetworkConfig;
pub use error::{CoreError, Result};
pub use rpc::RpcClient;
pub use storage::{CommitmentData, CommitmentStore, Storage};
pub use types::{ConnectorKind, Log, TransactionReceipt, TxRequest};
pub use wallet::{LocalWallet, NodeConnector, WalletConnector, WalletManager};

pub use alloy_primitives::{Address, Bytes, B256, U256};
