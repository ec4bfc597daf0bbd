mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{CliConfig, NetworkFlags};
use rps_core::{CoreError, WalletManager};
use rps_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "On-chain Rock Paper Scissors with commit-reveal")]
#[command(version)]
struct Cli {
    /// Data directory for wallets, move secrets and settings
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Network preset (local, mainnet, arbitrum, base, polygon)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// RPC endpoint URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Game contract address
    #[arg(long, global = true)]
    contract: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet management commands
    #[command(subcommand)]
    Wallet(commands::WalletCommands),

    /// Create, join, reveal and inspect games
    #[command(subcommand)]
    Game(commands::GameCommands),

    /// Saved network settings
    #[command(subcommand)]
    Settings(commands::SettingsCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "rps={0},rps_core={0},rps_game={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rps")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    let saved = CliConfig::load(&data_dir)?;
    let flags = NetworkFlags {
        network: cli.network,
        rpc_url: cli.rpc_url,
        contract: cli.contract,
    };
    let network = saved.network_config(&flags, |key| std::env::var(key).ok());

    let result = match cli.command {
        Commands::Settings(cmd) => {
            return Ok(commands::handle_settings_command(
                cmd,
                &data_dir,
                saved,
                network.as_ref().ok(),
            )?);
        }
        Commands::Wallet(cmd) => {
            let network = network?;
            let manager = WalletManager::new(&data_dir).await?;
            commands::handle_wallet_command(cmd, &manager, &network)
                .await
                .map_err(GameError::from)
        }
        Commands::Game(cmd) => {
            let network = network?;
            let manager = WalletManager::new(&data_dir).await?;
            commands::handle_game_command(cmd, &manager, &network).await
        }
    };

    if let Err(e) = result {
        match e {
            GameError::Core(CoreError::WalletNotFound { name }) => {
                eprintln!("Error: Wallet '{}' not found", name);
                eprintln!("Use 'rps wallet list' to see available wallets");
            }
            GameError::Core(CoreError::Http(err)) => {
                eprintln!("Error: Could not reach the RPC endpoint: {}", err);
                eprintln!("Check --rpc-url or RPS_RPC_URL");
            }
            GameError::Core(CoreError::Timeout(msg)) => {
                eprintln!("Error: {}", msg);
                eprintln!("The transaction may still be mined; check with 'rps game status'");
            }
            GameError::ContractReverted { reason } => {
                eprintln!("Error: The contract rejected the transaction: {}", reason);
            }
            GameError::MissingSecret(game_id) => {
                eprintln!("Error: No stored move secret for game {}", game_id);
                eprintln!(
                    "Reveal manually with 'rps game reveal {} --move <move> --salt <salt>'",
                    game_id
                );
            }
            GameError::NotYourTurn(game_id) => {
                eprintln!("Error: You cannot reveal in game {} right now", game_id);
                eprintln!("Use 'rps game status {}' to see the current phase", game_id);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
