pub mod game;
pub mod settings;
pub mod wallet;

pub use game::{handle_game_command, GameCommands};
pub use settings::{handle_settings_command, SettingsCommands};
pub use wallet::{handle_wallet_command, WalletCommands};
