use crate::{GameRecord, Result, RpsContract};
use alloy_primitives::Address;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse status shown in the game list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListStatus {
    Finished,
    WaitingForPlayer2,
    RevealPhase,
    CommitPhase,
}

impl ListStatus {
    pub fn of(record: &GameRecord) -> Self {
        if record.settled {
            ListStatus::Finished
        } else if !record.has_opponent() {
            ListStatus::WaitingForPlayer2
        } else if record.reveal_deadline > 0 {
            ListStatus::RevealPhase
        } else {
            ListStatus::CommitPhase
        }
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ListStatus::Finished => "Finished",
            ListStatus::WaitingForPlayer2 => "Waiting for Player 2",
            ListStatus::RevealPhase => "Reveal Phase",
            ListStatus::CommitPhase => "Commit Phase",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: u64,
    pub record: GameRecord,
    pub status: ListStatus,
    pub can_join: bool,
    pub is_my_game: bool,
}

impl GameSummary {
    pub fn new(game_id: u64, record: GameRecord, viewer: Address) -> Self {
        Self {
            game_id,
            status: ListStatus::of(&record),
            can_join: record.can_join(viewer),
            is_my_game: record.is_player(viewer),
            record,
        }
    }
}

/// The last `window` ids below `next_game_id`, newest first
pub fn recent_ids(next_game_id: u64, window: u64) -> Vec<u64> {
    (next_game_id.saturating_sub(window)..next_game_id)
        .rev()
        .collect()
}

/// Fetch the most recent games concurrently. Records that fail to load or do
/// not exist are skipped.
pub async fn fetch_games(
    contract: &RpsContract,
    viewer: Address,
    window: u64,
) -> Result<Vec<GameSummary>> {
    let next_game_id = contract.next_game_id().await?;
    let ids = recent_ids(next_game_id, window);

    tracing::debug!(
        "Fetching {} games below id {}",
        ids.len(),
        next_game_id
    );

    let fetches = ids.iter().map(|&id| async move { (id, contract.game(id).await) });
    let results = join_all(fetches).await;

    let mut games = Vec::with_capacity(results.len());
    for (id, result) in results {
        match result {
            Ok(record) if record.exists() => games.push(GameSummary::new(id, record, viewer)),
            Ok(_) => tracing::debug!("Game {} is empty, skipping", id),
            Err(e) => tracing::warn!("Failed to fetch game {}: {}", id, e),
        }
    }

    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Move;
    use alloy_primitives::{address, B256, U256};

    const A: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const B: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn record() -> GameRecord {
        GameRecord {
            player1: A,
            player2: Address::ZERO,
            stake: U256::from(1u64),
            created_at: 1,
            reveal_deadline: 0,
            player1_commit: B256::repeat_byte(1),
            player2_commit: B256::ZERO,
            player1_move: Move::None,
            player2_move: Move::None,
            settled: false,
        }
    }

    #[test]
    fn test_recent_ids_newest_first() {
        assert_eq!(recent_ids(5, 20), vec![4, 3, 2, 1, 0]);
        assert_eq!(recent_ids(30, 3), vec![29, 28, 27]);
        assert!(recent_ids(0, 20).is_empty());
    }

    #[test]
    fn test_status_labels() {
        let mut game = record();
        assert_eq!(ListStatus::of(&game).to_string(), "Waiting for Player 2");

        game.player2 = B;
        assert_eq!(ListStatus::of(&game).to_string(), "Commit Phase");

        game.reveal_deadline = 100;
        assert_eq!(ListStatus::of(&game).to_string(), "Reveal Phase");

        game.settled = true;
        assert_eq!(ListStatus::of(&game).to_string(), "Finished");
    }

    #[test]
    fn test_summary_flags() {
        let summary = GameSummary::new(3, record(), B);
        assert!(summary.can_join);
        assert!(!summary.is_my_game);

        let mine = GameSummary::new(3, record(), A);
        assert!(!mine.can_join);
        assert!(mine.is_my_game);
    }
}
