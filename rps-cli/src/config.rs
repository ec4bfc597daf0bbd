use anyhow::{Context, Result};
use rps_core::wallet::parse_address;
use rps_core::NetworkConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const ENV_RPC_URL: &str = "RPS_RPC_URL";
pub const ENV_CONTRACT: &str = "RPS_CONTRACT_ADDRESS";

/// Persistent CLI settings, stored as `<data_dir>/config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub share_base_url: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct NetworkFlags {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub contract: Option<String>,
}

impl CliConfig {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Missing file means defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Flag, then environment, then this file, then the preset
    pub fn network_config(
        &self,
        flags: &NetworkFlags,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<NetworkConfig> {
        let preset = first_set([flags.network.clone(), self.network.clone()])
            .unwrap_or_else(|| "local".to_string());
        let mut config = NetworkConfig::preset(&preset)?;

        if let Some(rpc_url) = first_set([flags.rpc_url.clone(), env(ENV_RPC_URL), self.rpc_url.clone()]) {
            config = config.with_rpc_url(rpc_url);
        }

        if let Some(contract) = first_set([
            flags.contract.clone(),
            env(ENV_CONTRACT),
            self.contract_address.clone(),
        ]) {
            let address = parse_address(&contract).context("Invalid contract address")?;
            config = config.with_contract(address);
        }

        if let Some(base) = &self.share_base_url {
            config.share_base_url = base.clone();
        }

        Ok(config)
    }
}

fn first_set<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}
