pub mod commitment_store;
pub mod wallet_store;

pub use commitment_store::{CommitmentData, CommitmentStore};
pub use wallet_store::{WalletData, WalletStore};

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Wallets table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS wallets (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                address TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                encrypted_seed TEXT NOT NULL
            )",
            [],
        )?;

        // Move secrets, saved before the commit transaction is sent
        conn.execute(
            "CREATE TABLE IF NOT EXISTS commitments (
                chain_id INTEGER NOT NULL,
                contract TEXT NOT NULL,
                commit_hash TEXT NOT NULL,
                game_id INTEGER,
                player TEXT NOT NULL,
                move_raw INTEGER NOT NULL,
                salt TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (chain_id, contract, commit_hash)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_commitments_game
             ON commitments (chain_id, contract, game_id, player)",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rps.db");

        Storage::new(&path).await.unwrap();
        let storage = Storage::new(&path).await.unwrap();

        let conn = storage.get_connection().await;
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('wallets', 'commitments')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
