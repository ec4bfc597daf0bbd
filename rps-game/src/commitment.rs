use crate::{GameError, Move, Result};
use alloy_primitives::{keccak256, Address, B256};
use rand::RngCore;
use rps_core::CommitmentData;
use serde::{Deserialize, Serialize};

/// keccak256(abi.encodePacked(uint8 move, bytes32 salt, address player))
pub fn compute_commit(player_move: Move, salt: B256, player: Address) -> B256 {
    let mut packed = [0u8; 53];
    packed[0] = player_move.raw();
    packed[1..33].copy_from_slice(salt.as_slice());
    packed[33..].copy_from_slice(player.as_slice());
    keccak256(packed)
}

/// Rnd 32-byte salt for a commitment
pub fn generate_salt() -> B256 {
    let mut salt = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut salt);
    B256::from(salt)
}

/// Everything a player needs to reveal later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSecret {
    pub player_move: Move,
    pub salt: B256,
    pub commit: B256,
}

impl CommitSecret {
    /// Fresh salt, commit bound to `player`
    pub fn new(player_move: Move, player: Address) -> Result<Self> {
        Self::with_salt(player_move, generate_salt(), player)
    }

    pub fn with_salt(player_move: Move, salt: B256, player: Address) -> Result<Self> {
        if !player_move.is_revealed() {
            return Err(GameError::internal("Cannot commit to an unselected move"));
        }

        Ok(Self {
            player_move,
            salt,
            commit: compute_commit(player_move, salt, player),
        })
    }

    pub fn to_record(
        &self,
        chain_id: u64,
        contract: Address,
        player: Address,
        game_id: Option<u64>,
    ) -> CommitmentData {
        CommitmentData {
            chain_id,
            contract,
            commit: self.commit,
            game_id,
            player,
            move_raw: self.player_move.raw(),
            salt: self.salt,
            created_at: chrono::Utc::now(),
        }
    }
}

impl TryFrom<CommitmentData> for CommitSecret {
    type Error = GameError;

    fn try_from(data: CommitmentData) -> Result<Self> {
        Ok(Self {
            player_move: Move::try_from(data.move_raw)?,
            salt: data.salt,
            commit: data.commit,
        })
    }
}
