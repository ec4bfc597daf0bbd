use crate::error::{CoreError, Result};
use crate::storage::{Storage, WalletData, WalletStore};
use crate::wallet::keystore::{decrypt_seed, encrypt_seed};
use crate::wallet::{address_from_secret_key, generate_mnemonic, mnemonic_to_secret_key, LocalWallet};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub struct WalletManager {
    storage: Arc<Storage>,
    wallets: Arc<RwLock<HashMap<String, Arc<LocalWallet>>>>,
}

impl WalletManager {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let db_path = data_dir.join("rps.db");
        let storage = Arc::new(Storage::new(&db_path).await?);

        Ok(Self::with_storage(storage))
    }

    pub fn with_storage(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            wallets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Create a wallet from a fresh 24-word mnemonic, returned to the caller once
    pub async fn create_wallet(
        &self,
        name: &str,
        password: &str,
    ) -> Result<(Arc<LocalWallet>, String)> {
        let mnemonic = generate_mnemonic()?;
        let wallet = self.store_wallet(name, &mnemonic, password).await?;

        tracing::info!("Created wallet '{}' ({})", name, wallet.address());
        Ok((wallet, mnemonic))
    }

    pub async fn import_wallet(
        &self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<Arc<LocalWallet>> {
        let wallet = self.store_wallet(name, mnemonic.trim(), password).await?;

        tracing::info!("Imported wallet '{}' ({})", name, wallet.address());
        Ok(wallet)
    }

    async fn store_wallet(
        &self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<Arc<LocalWallet>> {
        if name.trim().is_empty() {
            return Err(CoreError::config("Wallet name cannot be empty"));
        }

        if password.is_empty() {
            return Err(CoreError::config("Wallet password cannot be empty"));
        }

        // Check if wallet already exists
        let wallet_store = WalletStore::new(&self.storage);
        if wallet_store.wallet_exists(name).await? {
            return Err(CoreError::config(format!(
                "Wallet '{}' already exists",
                name
            )));
        }

        // Validate mnemonic and derive the signing key
        let secret_key = mnemonic_to_secret_key(mnemonic)?;

        let wallet_id = Uuid::new_v4().to_string();
        let wallet_data = WalletData {
            id: wallet_id.clone(),
            name: name.to_string(),
            address: address_from_secret_key(&secret_key),
            created_at: Utc::now(),
            encrypted_seed: encrypt_seed(mnemonic, password)?,
        };

        wallet_store.save_wallet(&wallet_data).await?;

        let wallet = Arc::new(LocalWallet::new(wallet_id.clone(), name.to_string(), secret_key));

        // Cache the wallet
        {
            let mut wallets = self.wallets.write();
            wallets.insert(wallet_id, wallet.clone());
        }

        Ok(wallet)
    }

    pub async fn load_wallet(&self, name: &str, password: &str) -> Result<Arc<LocalWallet>> {
        // Check cache first
        {
            let wallets = self.wallets.read();
            if let Some(wallet) = wallets.values().find(|w| w.name() == name) {
                return Ok(wallet.clone());
            }
        }

        let wallet_store = WalletStore::new(&self.storage);
        let wallet_data = wallet_store
            .find_by_name(name)
            .await?
            .ok_or_else(|| CoreError::WalletNotFound {
                name: name.to_string(),
            })?;

        let mnemonic = decrypt_seed(&wallet_data.encrypted_seed, password)?;
        let secret_key = mnemonic_to_secret_key(&mnemonic)?;

        let wallet = Arc::new(LocalWallet::new(
            wallet_data.id.clone(),
            wallet_data.name.clone(),
            secret_key,
        ));

        if wallet.address() != wallet_data.address {
            return Err(CoreError::wallet(format!(
                "Wallet '{}' seed does not match its stored address",
                name
            )));
        }

        // Cache the wallet
        {
            let mut wallets = self.wallets.write();
            wallets.insert(wallet_data.id, wallet.clone());
        }

        Ok(wallet)
    }

    /// Stored wallet metadata; does not need the password
    pub async fn list_wallets(&self) -> Result<Vec<WalletData>> {
        let wallet_store = WalletStore::new(&self.storage);
        wallet_store.list_wallets().await
    }

    pub async fn wallet_info(&self, name: &str) -> Result<WalletData> {
        let wallet_store = WalletStore::new(&self.storage);
        wallet_store
            .find_by_name(name)
            .await?
            .ok_or_else(|| CoreError::WalletNotFound {
                name: name.to_string(),
            })
    }

    pub async fn delete_wallet(&self, name: &str) -> Result<()> {
        let wallet_data = self.wallet_info(name).await?;

        // Remove from cache
        {
            let mut wallets = self.wallets.write();
            wallets.remove(&wallet_data.id);
        }

        let wallet_store = WalletStore::new(&self.storage);
        wallet_store.delete_wallet(&wallet_data.id).await?;

        tracing::info!("Deleted wallet '{}'", name);
        Ok(())
    }
}
