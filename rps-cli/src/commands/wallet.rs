use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Password};
use rps_core::{NetworkConfig, Result, RpcClient, WalletManager};
use rps_game::display::format_stake;

pub const ENV_PASSWORD: &str = "RPS_WALLET_PASSWORD";

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet name
        name: String,
    },
    /// Import a wallet from mnemonic
    Import {
        /// Wallet name
        name: String,
        /// Mnemonic phrase (will prompt if not provided)
        #[arg(short, long)]
        mnemonic: Option<String>,
    },
    /// List all wallets
    List,
    /// Show wallet address and balance
    Info {
        /// Wallet name
        name: String,
    },
    /// Delete a wallet
    Delete {
        /// Wallet name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_wallet_command(
    cmd: WalletCommands,
    manager: &WalletManager,
    network: &NetworkConfig,
) -> Result<()> {
    match cmd {
        WalletCommands::Create { name } => {
            let password = read_password(true)?;

            println!("Creating wallet '{}'...", name);
            let (wallet, mnemonic) = manager.create_wallet(&name, &password).await?;

            println!("Wallet created successfully!");
            println!();
            println!("IMPORTANT: Save your mnemonic phrase securely!");
            println!("Mnemonic: {}", mnemonic);
            println!();
            println!("Wallet Details:");
            println!("  Name: {}", wallet.name());
            println!("  ID: {}", wallet.id());
            println!("  Address: {}", wallet.address());
        }

        WalletCommands::Import { name, mnemonic } => {
            let mnemonic = match mnemonic {
                Some(m) => m,
                None => Password::new()
                    .with_prompt("Enter mnemonic phrase")
                    .interact()?,
            };
            let password = read_password(true)?;

            println!("Importing wallet '{}'...", name);
            let wallet = manager.import_wallet(&name, &mnemonic, &password).await?;

            println!("Wallet imported successfully!");
            println!("  Name: {}", wallet.name());
            println!("  ID: {}", wallet.id());
            println!("  Address: {}", wallet.address());
        }

        WalletCommands::List => {
            let wallets = manager.list_wallets().await?;

            if wallets.is_empty() {
                println!("No wallets found.");
                println!("Create a new wallet with: rps wallet create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Address", "Created"]);

            for wallet in wallets {
                table.add_row(vec![
                    wallet.name,
                    wallet.address.to_string(),
                    wallet.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }

            println!("{}", table);
        }

        WalletCommands::Info { name } => {
            let wallet = manager.wallet_info(&name).await?;

            println!("Wallet Information:");
            println!("  Name: {}", wallet.name);
            println!("  ID: {}", wallet.id);
            println!("  Address: {}", wallet.address);
            println!("  Created: {}", wallet.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!();

            let rpc = RpcClient::new(&network.rpc_url)?;
            match rpc.balance(wallet.address).await {
                Ok(balance) => println!("Balance on {}: {} ETH", network.name, format_stake(balance)),
                Err(e) => {
                    tracing::debug!("Balance lookup failed: {}", e);
                    println!("Balance on {}: unavailable ({})", network.name, network.rpc_url);
                }
            }
        }

        WalletCommands::Delete { name, force } => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete wallet '{}'? This action cannot be undone.",
                        name
                    ))
                    .default(false)
                    .interact()?;

                if !confirm {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            manager.delete_wallet(&name).await?;
            println!("Wallet '{}' deleted successfully.", name);
        }
    }

    Ok(())
}

/// Wallet password from the environment, otherwise prompted
pub fn read_password(confirm: bool) -> Result<String> {
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        return Ok(password);
    }

    let mut prompt = Password::new().with_prompt("Wallet password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }

    Ok(prompt.interact()?)
}
