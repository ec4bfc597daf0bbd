use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("{0}")]
    Core(#[from] rps_core::CoreError),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Invalid move value: {0}")]
    InvalidMove(u8),

    #[error("Unknown move '{0}'. Use rock, paper or scissors")]
    UnknownMove(String),

    #[error("Game {0} not found")]
    GameNotFound(u64),

    #[error("Cannot join game: {0}")]
    CannotJoin(String),

    #[error("Not your turn to reveal in game {0}")]
    NotYourTurn(u64),

    #[error("No stored move secret for game {0}")]
    MissingSecret(u64),

    #[error("Contract reverted: {reason}")]
    ContractReverted { reason: String },

    #[error("Receipt has no {0} event")]
    MissingEvent(&'static str),

    #[error("Invalid stake: {0}")]
    InvalidStake(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn cannot_join(msg: impl Into<String>) -> Self {
        Self::CannotJoin(msg.into())
    }
}
