use crate::error::{CoreError, Result};
use crate::storage::Storage;
use crate::wallet::parse_address;
use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A player's hidden move and salt for one commit hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentData {
    pub chain_id: u64,
    pub contract: Address,
    pub commit: B256,
    /// Unknown for a create until the GameCreated event is read back
    pub game_id: Option<u64>,
    pub player: Address,
    pub move_raw: u8,
    pub salt: B256,
    pub created_at: DateTime<Utc>,
}

pub struct CommitmentStore<'a> {
    storage: &'a Storage,
}

impl<'a> CommitmentStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save(&self, data: &CommitmentData) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO commitments
             (chain_id, contract, commit_hash, game_id, player, move_raw, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                data.chain_id as i64,
                data.contract.to_string(),
                data.commit.to_string(),
                data.game_id.map(|id| id as i64),
                data.player.to_string(),
                data.move_raw,
                data.salt.to_string(),
                data.created_at.timestamp(),
            ],
        )?;

        tracing::debug!("Saved commitment {} for {}", data.commit, data.player);
        Ok(())
    }

    /// Attach the game id once the create transaction has been mined
    pub async fn assign_game_id(
        &self,
        chain_id: u64,
        contract: Address,
        commit: B256,
        game_id: u64,
    ) -> Result<()> {
        let conn = self.storage.get_connection().await;

        let updated = conn.execute(
            "UPDATE commitments SET game_id = ?1
             WHERE chain_id = ?2 AND contract = ?3 AND commit_hash = ?4",
            params![
                game_id as i64,
                chain_id as i64,
                contract.to_string(),
                commit.to_string()
            ],
        )?;

        if updated == 0 {
            return Err(CoreError::internal(format!(
                "No stored commitment {}",
                commit
            )));
        }

        Ok(())
    }

    pub async fn find_for_game(
        &self,
        chain_id: u64,
        contract: Address,
        game_id: u64,
        player: Address,
    ) -> Result<Option<CommitmentData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT chain_id, contract, commit_hash, game_id, player, move_raw, salt, created_at
             FROM commitments
             WHERE chain_id = ?1 AND contract = ?2 AND game_id = ?3 AND player = ?4
             ORDER BY created_at DESC",
        )?;

        let mut rows = stmt.query_map(
            params![
                chain_id as i64,
                contract.to_string(),
                game_id as i64,
                player.to_string()
            ],
            read_row,
        )?;

        match rows.next() {
            Some(row) => Ok(Some(into_commitment(row?)?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_player(&self, player: Address) -> Result<Vec<CommitmentData>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT chain_id, contract, commit_hash, game_id, player, move_raw, salt, created_at
             FROM commitments WHERE player = ?1 ORDER BY created_at DESC",
        )?;

        let iter = stmt.query_map(params![player.to_string()], read_row)?;

        let mut commitments = Vec::new();
        for row in iter {
            commitments.push(into_commitment(row?)?);
        }

        Ok(commitments)
    }

    pub async fn remove(&self, chain_id: u64, contract: Address, commit: B256) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "DELETE FROM commitments WHERE chain_id = ?1 AND contract = ?2 AND commit_hash = ?3",
            params![chain_id as i64, contract.to_string(), commit.to_string()],
        )?;

        Ok(())
    }
}

type RawCommitment = (i64, String, String, Option<i64>, String, u8, String, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawCommitment> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_commitment(raw: RawCommitment) -> Result<CommitmentData> {
    let (chain_id, contract, commit, game_id, player, move_raw, salt, created_at) = raw;

    Ok(CommitmentData {
        chain_id: chain_id as u64,
        contract: parse_address(&contract)?,
        commit: parse_b256(&commit)?,
        game_id: game_id.map(|id| id as u64),
        player: parse_address(&player)?,
        move_raw,
        salt: parse_b256(&salt)?,
        created_at: DateTime::from_timestamp(created_at, 0)
            .ok_or_else(|| CoreError::internal("Invalid commitment timestamp"))?,
    })
}

fn parse_b256(value: &str) -> Result<B256> {
    B256::from_str(value).map_err(|e| CoreError::internal(format!("Invalid hash {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(commit: u8, game_id: Option<u64>) -> CommitmentData {
        CommitmentData {
            chain_id: 31337,
            contract: Address::repeat_byte(0xaa),
            commit: B256::repeat_byte(commit),
            game_id,
            player: Address::repeat_byte(0x01),
            move_raw: 2,
            salt: B256::repeat_byte(0x5a),
            created_at: DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_assign_and_find() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("rps.db")).await.unwrap();
        let store = CommitmentStore::new(&storage);

        let data = sample(0x01, None);
        store.save(&data).await.unwrap();

        // not attached to a game yet
        let found = store
            .find_for_game(data.chain_id, data.contract, 4, data.player)
            .await
            .unwrap();
        assert!(found.is_none());

        store
            .assign_game_id(data.chain_id, data.contract, data.commit, 4)
            .await
            .unwrap();

        let found = store
            .find_for_game(data.chain_id, data.contract, 4, data.player)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.game_id, Some(4));
        assert_eq!(found.salt, data.salt);
        assert_eq!(found.move_raw, 2);
    }

    #[tokio::test]
    async fn test_assign_unknown_commit() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("rps.db")).await.unwrap();
        let store = CommitmentStore::new(&storage);

        let result = store
            .assign_game_id(1, Address::ZERO, B256::ZERO, 9)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("rps.db")).await.unwrap();
        let store = CommitmentStore::new(&storage);

        let data = sample(0x02, Some(7));
        store.save(&data).await.unwrap();
        assert_eq!(store.list_for_player(data.player).await.unwrap().len(), 1);

        store
            .remove(data.chain_id, data.contract, data.commit)
            .await
            .unwrap();
        assert!(store.list_for_player(data.player).await.unwrap().is_empty());
    }
}
