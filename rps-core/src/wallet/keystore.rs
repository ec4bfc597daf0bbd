use crate::error::{CoreError, Result};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SALT_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Password-encrypted seed as stored in the wallets table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedSeed {
    pub version: u32,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// Encrypt a mnemonic with ChaCha20Poly1305 under a PBKDF2-derived key
pub fn encrypt_seed(mnemonic: &str, password: &str) -> Result<EncryptedSeed> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(password, &salt);
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let cipher = ChaCha20Poly1305::new(&key);

    let ciphertext = cipher
        .encrypt(&nonce, mnemonic.as_bytes())
        .map_err(|e| CoreError::wallet(format!("Seed encryption failed: {}", e)))?;

    let checksum = calculate_checksum(&ciphertext);

    Ok(EncryptedSeed {
        version: 1,
        salt: salt.to_vec(),
        nonce: nonce.to_vec(),
        ciphertext,
        checksum,
        created_at: Utc::now(),
    })
}

pub fn decrypt_seed(seed: &EncryptedSeed, password: &str) -> Result<String> {
    if calculate_checksum(&seed.ciphertext) != seed.checksum {
        return Err(CoreError::wallet("Seed checksum verification failed"));
    }

    if seed.nonce.len() != NONCE_SIZE {
        return Err(CoreError::wallet("Corrupted seed nonce"));
    }

    let key = derive_key(password, &seed.salt);
    let cipher = ChaCha20Poly1305::new(&key);
    let nonce = Nonce::from_slice(&seed.nonce);

    let plaintext = cipher
        .decrypt(nonce, seed.ciphertext.as_ref())
        .map_err(|_| CoreError::wallet("Wrong password or corrupted seed"))?;

    String::from_utf8(plaintext)
        .map_err(|e| CoreError::internal(format!("Seed is not valid UTF-8: {}", e)))
}

fn derive_key(password: &str, salt: &[u8]) -> Key {
    use pbkdf2::pbkdf2_hmac;

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    *Key::from_slice(&key)
}

fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
