use crate::error::{CoreError, Result};
use crate::rpc::RpcClient;
use crate::types::{ConnectorKind, TxRequest};
use crate::wallet::{address_from_secret_key, WalletConnector};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use async_trait::async_trait;
use secp256k1::{Message, Secp256k1, SecretKey};

/// Gas limit headroom over the node's estimate, in percent
const GAS_LIMIT_MARGIN: u64 = 20;

/// Wallet backed by a key from the local keystore; signs EIP-155 legacy transactions
pub struct LocalWallet {
    id: String,
    name: String,
    secret_key: SecretKey,
    address: Address,
}

impl LocalWallet {
    pub fn new(id: String, name: String, secret_key: SecretKey) -> Self {
        let address = address_from_secret_key(&secret_key);
        Self {
            id,
            name,
            secret_key,
            address,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<Bytes> {
        if tx.chain_id == 0 {
            return Err(CoreError::signing("EIP-155 requires a non-zero chain id"));
        }

        let secp = Secp256k1::signing_only();
        let digest = tx.signature_hash();
        let message = Message::from_digest(digest.0);

        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let r = U256::from_be_slice(&compact[..32]);
        let s = U256::from_be_slice(&compact[32..]);
        let v = eip155_v(recovery_id.to_i32() as u64, tx.chain_id);

        Ok(tx.encode_signed(v, r, s))
    }
}

#[async_trait]
impl WalletConnector for LocalWallet {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Local
    }

    async fn account(&self, _rpc: &RpcClient) -> Result<Address> {
        Ok(self.address)
    }

    async fn send_transaction(&self, rpc: &RpcClient, request: TxRequest) -> Result<B256> {
        let request = request.from(self.address);

        let chain_id = rpc.chain_id().await?;
        let nonce = rpc.transaction_count(self.address).await?;
        let gas_price = rpc.gas_price().await?;
        let gas_limit = match request.gas {
            Some(gas) => gas,
            None => {
                let estimate = rpc.estimate_gas(&request).await?;
                estimate + estimate * U256::from(GAS_LIMIT_MARGIN) / U256::from(100)
            }
        };

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: request.to,
            value: request.value.unwrap_or_default(),
            input: request.data,
            chain_id,
        };

        let raw = self.sign_transaction(&tx)?;
        let tx_hash = rpc.send_raw_transaction(&raw).await?;

        tracing::info!(
            "Wallet '{}' sent transaction {} (nonce {})",
            self.name,
            tx_hash,
            nonce
        );
        Ok(tx_hash)
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

/// Pre-EIP-2718 transaction with EIP-155 replay protection
#[derive(Debug, Clone)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
    }

    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.input.length()
    }

    /// keccak256(rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0]))
    pub fn signature_hash(&self) -> B256 {
        let payload_length = self.fields_length() + self.chain_id.length() + 2 * 0u8.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        self.chain_id.encode(&mut out);
        0u8.encode(&mut out);
        0u8.encode(&mut out);

        keccak256(&out)
    }

    pub fn encode_signed(&self, v: u64, r: U256, s: U256) -> Bytes {
        let payload_length = self.fields_length() + v.length() + r.length() + s.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);

        Bytes::from(out)
    }
}

fn eip155_v(recovery_id: u64, chain_id: u64) -> u64 {
    recovery_id + chain_id * 2 + 35
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::mnemonic_to_secret_key;
    use alloy_primitives::address;
    use alloy_rlp::Decodable;

    fn anvil_wallet() -> LocalWallet {
        let key =
            mnemonic_to_secret_key("test test test test test test test test test test test junk")
                .unwrap();
        LocalWallet::new("id".to_string(), "anvil".to_string(), key)
    }

    fn sample_tx() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 3,
            gas_price: U256::from(1_000_000_000u64),
            gas_limit: U256::from(120_000u64),
            to: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            value: U256::from(1_000_000_000_000_000u64),
            input: Bytes::from(vec![0x12, 0x34]),
            chain_id: 31337,
        }
    }

    #[test]
    fn test_eip155_v() {
        assert_eq!(eip155_v(0, 1), 37);
        assert_eq!(eip155_v(1, 1), 38);
        assert_eq!(eip155_v(0, 31337), 62709);
    }

    #[test]
    fn test_signed_encoding_is_rlp_list() {
        let wallet = anvil_wallet();
        let tx = sample_tx();
        let raw = wallet.sign_transaction(&tx).unwrap();

        let mut buf: &[u8] = &raw;
        let header = Header::decode(&mut buf).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length, buf.len());

        // nonce is the first field
        let nonce = u64::decode(&mut buf).unwrap();
        assert_eq!(nonce, 3);
    }

    #[test]
    fn test_zero_chain_rejected() {
        let wallet = anvil_wallet();
        let mut tx = sample_tx();
        tx.chain_id = 0;
        assert!(wallet.sign_transaction(&tx).is_err());
    }

    #[test]
    fn test_signature_hash_depends_on_chain() {
        let tx = sample_tx();
        let mut other = sample_tx();
        other.chain_id = 1;
        assert_ne!(tx.signature_hash(), other.signature_hash());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let wallet = anvil_wallet();
        let tx = sample_tx();
        assert_eq!(
            wallet.sign_transaction(&tx).unwrap(),
            wallet.sign_transaction(&tx).unwrap()
        );
    }
}
