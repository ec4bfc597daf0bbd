//! Commit-reveal Rock-Paper-Scissors against an on-chain contract
//!
//! The contract owns the rules: commit verification, payouts and timeouts.
//! This crate derives a displayable phase from polled game records, builds
//! commits, keeps move secrets for later reveals and drives the contract
//! through a connected [`Session`].

pub mod commitment;
pub mod contract;
pub mod display;
pub mod error;
pub mod listing;
pub mod moves;
pub mod session;
pub mod share;
pub mod state;

pub use commitment::{compute_commit, generate_salt, CommitSecret};
pub use contract::RpsContract;
pub use error::{GameError, Result};
pub use listing::{GameSummary, ListStatus};
pub use moves::{get_winner, Move, Winner};
pub use session::Session;
pub use share::ShareLinks;
pub use state::{GameRecord, GameView, Phase};
