pub mod keystore;
pub mod local;
pub mod manager;
pub mod node;

pub use local::LocalWallet;
pub use manager::WalletManager;
pub use node::NodeConnector;

use crate::error::{CoreError, Result};
use crate::rpc::RpcClient;
use crate::types::{ConnectorKind, TxRequest};
use alloy_primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use bip39::{Language, Mnemonic};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::str::FromStr;

/// Standard Ethereum derivation path, first account
pub const ETH_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// A wallet backend that names an account and gets transactions signed and broadcast
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn kind(&self) -> ConnectorKind;

    /// Resolve the account this connector acts for
    async fn account(&self, rpc: &RpcClient) -> Result<Address>;

    /// Sign (or have signed) and broadcast, returning the transaction hash
    async fn send_transaction(&self, rpc: &RpcClient, request: TxRequest) -> Result<B256>;
}

pub fn generate_mnemonic() -> Result<String> {
    let mut rng = bip39::rand::thread_rng();
    let mnemonic = Mnemonic::generate_in_with(&mut rng, Language::English, 24)
        .map_err(|e| CoreError::internal(format!("Failed to generate mnemonic: {}", e)))?;
    Ok(mnemonic.to_string())
}

pub fn mnemonic_to_secret_key(mnemonic: &str) -> Result<SecretKey> {
    let mnemonic = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|e| CoreError::config(format!("Invalid mnemonic: {}", e)))?;

    let seed = mnemonic.to_seed("");
    let secp = bitcoin::secp256k1::Secp256k1::new();

    // the network byte only affects xpriv serialization, not the derived key
    let master_key = bitcoin::bip32::Xpriv::new_master(bitcoin::Network::Bitcoin, &seed)
        .map_err(|e| CoreError::internal(format!("Failed to derive master key: {}", e)))?;

    let path = bitcoin::bip32::DerivationPath::from_str(ETH_DERIVATION_PATH)
        .map_err(|e| CoreError::config(format!("Invalid derivation path: {}", e)))?;

    let child_key = master_key
        .derive_priv(&secp, &path)
        .map_err(|e| CoreError::internal(format!("Failed to derive child key: {}", e)))?;

    SecretKey::from_slice(&child_key.private_key.secret_bytes())
        .map_err(|e| CoreError::internal(format!("Invalid secret key: {}", e)))
}

/// Ethereum address: last 20 bytes of keccak256 over the uncompressed public key
pub fn address_from_secret_key(secret_key: &SecretKey) -> Address {
    let secp = Secp256k1::signing_only();
    let public_key = PublicKey::from_secret_key(&secp, secret_key);
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Parse an account identifier, ignoring hex case
pub fn parse_address(input: &str) -> Result<Address> {
    Address::from_str(input.trim()).map_err(|e| CoreError::InvalidAddress(format!("{}: {}", input, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ANVIL_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[test]
    fn test_known_derivation() {
        let key = mnemonic_to_secret_key(ANVIL_MNEMONIC).unwrap();
        assert_eq!(
            address_from_secret_key(&key),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_generated_mnemonic_is_valid() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 24);
        assert!(mnemonic_to_secret_key(&mnemonic).is_ok());
    }

    #[test]
    fn test_invalid_mnemonic() {
        assert!(mnemonic_to_secret_key("not a real mnemonic").is_err());
    }

    #[test]
    fn test_parse_address_ignores_case() {
        let lower = parse_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let upper = parse_address("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266").unwrap();
        assert_eq!(lower, upper);
        assert!(parse_address("0x1234").is_err());
    }
}
