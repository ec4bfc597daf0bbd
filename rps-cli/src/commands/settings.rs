use crate::config::CliConfig;
use anyhow::Result;
use clap::Subcommand;
use rps_core::wallet::parse_address;
use rps_core::NetworkConfig;
use std::path::Path;

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show the saved settings and the resolved network
    Show,
    /// Save defaults used when no flag or environment variable is given
    Set {
        /// Network preset (local, mainnet, arbitrum, base, polygon)
        #[arg(long)]
        preset: Option<String>,
        /// RPC endpoint URL
        #[arg(long)]
        rpc: Option<String>,
        /// Game contract address
        #[arg(long)]
        address: Option<String>,
        /// Base URL used for share links
        #[arg(long)]
        share_url: Option<String>,
    },
    /// Remove all saved settings
    Reset,
}

pub fn handle_settings_command(
    cmd: SettingsCommands,
    data_dir: &Path,
    saved: CliConfig,
    network: Option<&NetworkConfig>,
) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            println!("Settings file: {}", CliConfig::path(data_dir).display());
            println!("{}", serde_json::to_string_pretty(&saved)?);
            println!();

            let Some(network) = network else {
                println!("Network could not be resolved from these settings.");
                return Ok(());
            };
            println!("Resolved network:");
            println!("  Name: {}", network.name);
            println!("  Chain ID: {}", network.chain_id);
            println!("  RPC URL: {}", network.rpc_url);
            println!("  Contract: {}", network.contract_address);
            println!("  Share base URL: {}", network.share_base_url);
        }

        SettingsCommands::Set {
            preset,
            rpc,
            address,
            share_url,
        } => {
            let mut config = saved;

            if let Some(name) = preset {
                NetworkConfig::preset(&name)?;
                config.network = Some(name);
            }
            if let Some(url) = rpc {
                config.rpc_url = Some(url);
            }
            if let Some(contract) = address {
                config.contract_address = Some(parse_address(&contract)?.to_string());
            }
            if let Some(url) = share_url {
                config.share_base_url = Some(url);
            }

            config.save(data_dir)?;
            println!("Settings saved.");
        }

        SettingsCommands::Reset => {
            CliConfig::default().save(data_dir)?;
            println!("Settings reset.");
        }
    }

    Ok(())
}
