use crate::{get_winner, GameError, Move, Result, Winner};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one game as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub player1: Address,
    /// `Address::ZERO` until an opponent joins
    pub player2: Address,
    pub stake: U256,
    pub created_at: u64,
    pub reveal_deadline: u64,
    pub player1_commit: B256,
    pub player2_commit: B256,
    pub player1_move: Move,
    pub player2_move: Move,
    pub settled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Create,
    Waiting,
    Commit,
    Reveal,
    Finished,
}

impl GameRecord {
    /// The contract hands back a zeroed struct for unknown ids
    pub fn exists(&self) -> bool {
        self.player1 != Address::ZERO
    }

    pub fn has_opponent(&self) -> bool {
        self.player2 != Address::ZERO
    }

    pub fn is_player(&self, account: Address) -> bool {
        account != Address::ZERO && (self.player1 == account || self.player2 == account)
    }

    /// First matching rule wins
    pub fn phase(&self, viewer: Address) -> Phase {
        if self.settled {
            return Phase::Finished;
        }

        if !self.has_opponent() {
            return if self.player1 == viewer {
                Phase::Waiting
            } else {
                Phase::Commit
            };
        }

        if self.reveal_deadline > 0
            && (!self.player1_move.is_revealed() || !self.player2_move.is_revealed())
        {
            return Phase::Reveal;
        }

        Phase::Finished
    }

    pub fn is_my_turn(&self, viewer: Address) -> bool {
        if self.phase(viewer) != Phase::Reveal || viewer == Address::ZERO {
            return false;
        }

        (self.player1 == viewer && !self.player1_move.is_revealed())
            || (self.player2 == viewer && !self.player2_move.is_revealed())
    }

    pub fn can_join(&self, viewer: Address) -> bool {
        !self.has_opponent() && self.player1 != viewer && !self.settled
    }

    /// Why `viewer` may not join, if anything
    pub fn ensure_joinable(&self, viewer: Address) -> Result<()> {
        if self.settled {
            return Err(GameError::cannot_join("game is already settled"));
        }
        if self.has_opponent() {
            return Err(GameError::cannot_join("game already has two players"));
        }
        if self.player1 == viewer {
            return Err(GameError::cannot_join("you created this game"));
        }
        Ok(())
    }

    pub fn winner(&self) -> Option<Winner> {
        get_winner(self.player1_move, self.player2_move)
    }

    /// Commit stored on-chain for `account`, if it plays in this game
    pub fn commit_of(&self, account: Address) -> Option<B256> {
        if account == Address::ZERO {
            None
        } else if self.player1 == account {
            Some(self.player1_commit)
        } else if self.player2 == account {
            Some(self.player2_commit)
        } else {
            None
        }
    }
}

/// Everything the presentation layer needs about one game and one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: Option<u64>,
    pub record: Option<GameRecord>,
    pub phase: Phase,
    pub winner: Option<Winner>,
    pub my_turn: bool,
    pub can_join: bool,
}

impl GameView {
    pub fn from_record(game_id: u64, record: GameRecord, viewer: Address) -> Self {
        Self {
            game_id: Some(game_id),
            phase: record.phase(viewer),
            winner: record.winner(),
            my_turn: record.is_my_turn(viewer),
            can_join: record.can_join(viewer),
            record: Some(record),
        }
    }

    /// A fetch failure or an unknown id degrades to a terminal view without a record
    pub fn resolve(
        game_id: u64,
        fetched: Result<GameRecord>,
        viewer: Address,
    ) -> Self {
        match fetched {
            Ok(record) if record.exists() => Self::from_record(game_id, record, viewer),
            Ok(_) => {
                tracing::warn!("Game {} does not exist", game_id);
                Self::unresolved(game_id)
            }
            Err(e) => {
                tracing::warn!("Failed to load game {}: {}", game_id, e);
                Self::unresolved(game_id)
            }
        }
    }

    pub fn unresolved(game_id: u64) -> Self {
        Self {
            game_id: Some(game_id),
            record: None,
            phase: Phase::Finished,
            winner: None,
            my_turn: false,
            can_join: false,
        }
    }

    /// View for a game that has not been created yet
    pub fn creating() -> Self {
        Self {
            game_id: None,
            record: None,
            phase: Phase::Create,
            winner: None,
            my_turn: false,
            can_join: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.record.is_some()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Create => write!(f, "Create"),
            Phase::Waiting => write!(f, "Waiting for opponent"),
            Phase::Commit => write!(f, "Commit"),
            Phase::Reveal => write!(f, "Reveal"),
            Phase::Finished => write!(f, "Finished"),
        }
    }
}
