use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Move as encoded by the contract. `None` is the hidden/unselected sentinel
/// and is never submitted on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    #[default]
    None = 0,
    Rock = 1,
    Paper = 2,
    Scissors = 3,
}

impl Move {
    pub const PLAYABLE: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn raw(self) -> u8 {
        self as u8
    }

    pub fn is_revealed(self) -> bool {
        self != Move::None
    }

    /// Rock beats Scissors, Scissors beats Paper, Paper beats Rock
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }

    pub fn icon(self) -> &'static str {
        match self {
            Move::Rock => "🪨",
            Move::Paper => "📄",
            Move::Scissors => "✂️",
            Move::None => "❓",
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = GameError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Move::None),
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            other => Err(GameError::InvalidMove(other)),
        }
    }
}

impl FromStr for Move {
    type Err = GameError;

    /// Accepts names, initials or raw values of playable moves
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" | "1" => Ok(Move::Rock),
            "paper" | "p" | "2" => Ok(Move::Paper),
            "scissors" | "s" | "3" => Ok(Move::Scissors),
            _ => Err(GameError::UnknownMove(s.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
            Move::None => "None",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player1,
    Player2,
    Tie,
}

/// Outcome of two revealed moves, player1 first. `None` while either is hidden.
pub fn get_winner(player1_move: Move, player2_move: Move) -> Option<Winner> {
    if !player1_move.is_revealed() || !player2_move.is_revealed() {
        return None;
    }

    if player1_move == player2_move {
        Some(Winner::Tie)
    } else if player1_move.beats(player2_move) {
        Some(Winner::Player1)
    } else {
        Some(Winner::Player2)
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Player1 => write!(f, "Player 1 wins"),
            Winner::Player2 => write!(f, "Player 2 wins"),
            Winner::Tie => write!(f, "Tie"),
        }
    }
}
