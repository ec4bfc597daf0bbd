use crate::error::{CoreError, Result};
use crate::storage::Storage;
use crate::wallet::keystore::EncryptedSeed;
use crate::wallet::parse_address;
use alloy_primitives::Address;
use chrono::Utc;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletData {
    pub id: String,
    pub name: String,
    pub address: Address,
    pub created_at: chrono::DateTime<Utc>,
    pub encrypted_seed: EncryptedSeed,
}

pub struct WalletStore<'a> {
    storage: &'a Storage,
}

impl<'a> WalletStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_wallet(&self, wallet_data: &WalletData) -> Result<()> {
        let conn = self.storage.get_connection().await;
        let seed_json = serde_json::to_string(&wallet_data.encrypted_seed)?;

        conn.execute(
            "INSERT OR REPLACE INTO wallets (id, name, address, created_at, encrypted_seed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                wallet_data.id,
                wallet_data.name,
                wallet_data.address.to_string(),
                wallet_data.created_at.timestamp(),
                seed_json,
            ],
        )?;

        Ok(())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<WalletData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, address, created_at, encrypted_seed
             FROM wallets WHERE name = ?1",
        )?;

        let mut rows = stmt.query_map(params![name], read_row)?;
        match rows.next() {
            Some(row) => Ok(Some(into_wallet_data(row?)?)),
            None => Ok(None),
        }
    }

    pub async fn list_wallets(&self) -> Result<Vec<WalletData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, name, address, created_at, encrypted_seed
             FROM wallets ORDER BY created_at DESC",
        )?;

        let wallet_iter = stmt.query_map([], read_row)?;

        let mut wallets = Vec::new();
        for wallet in wallet_iter {
            wallets.push(into_wallet_data(wallet?)?);
        }

        Ok(wallets)
    }

    pub async fn delete_wallet(&self, wallet_id: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;
        conn.execute("DELETE FROM wallets WHERE id = ?1", params![wallet_id])?;
        Ok(())
    }

    pub async fn wallet_exists(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM wallets WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

type RawWallet = (String, String, String, i64, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawWallet> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_wallet_data(raw: RawWallet) -> Result<WalletData> {
    let (id, name, address, created_at, seed_json) = raw;

    Ok(WalletData {
        id,
        name,
        address: parse_address(&address)?,
        created_at: chrono::DateTime::from_timestamp(created_at, 0)
            .ok_or_else(|| CoreError::internal("Invalid wallet timestamp"))?,
        encrypted_seed: serde_json::from_str(&seed_json)?,
    })
}
