use crate::error::{CoreError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub contract_address: Address,
    pub confirmation_poll_interval: Duration,
    pub confirmation_timeout: Duration,
    pub game_list_window: u64,
    pub share_base_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            chain_id: 31337,
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: Address::ZERO,
            confirmation_poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(180), // 3 minutes
            game_list_window: 20,
            share_base_url: "http://localhost:5173".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Known network presets by name
    pub fn preset(name: &str) -> Result<Self> {
        let mut config = Self::default();

        match name.to_lowercase().as_str() {
            "local" | "anvil" | "hardhat" => {
                // keep defaults for a local dev node
                config.confirmation_poll_interval = Duration::from_millis(500);
            }
            "mainnet" | "ethereum" => {
                config.name = "mainnet".to_string();
                config.chain_id = 1;
                config.rpc_url = "https://cloudflare-eth.com".to_string();
                config.confirmation_poll_interval = Duration::from_secs(4);
            }
            "arbitrum" => {
                config.name = "arbitrum".to_string();
                config.chain_id = 42161;
                config.rpc_url = "https://arb1.arbitrum.io/rpc".to_string();
            }
            "base" => {
                config.name = "base".to_string();
                config.chain_id = 8453;
                config.rpc_url = "https://mainnet.base.org".to_string();
            }
            "polygon" => {
                config.name = "polygon".to_string();
                config.chain_id = 137;
                config.rpc_url = "https://polygon-rpc.com".to_string();
            }
            _ => {
                return Err(CoreError::config(format!(
                    "Unknown network: {}. Supported networks: local, mainnet, arbitrum, base, polygon",
                    name
                )))
            }
        }

        Ok(config)
    }

    pub fn with_contract(mut self, contract_address: Address) -> Self {
        self.contract_address = contract_address;
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(CoreError::config("RPC URL cannot be empty"));
        }

        if self.contract_address == Address::ZERO {
            return Err(CoreError::config(
                "Contract address is not set (use --contract or RPS_CONTRACT_ADDRESS)",
            ));
        }

        if self.game_list_window == 0 {
            return Err(CoreError::config("Game list window must be greater than 0"));
        }

        if self.confirmation_poll_interval.is_zero() {
            return Err(CoreError::config(
                "Confirmation poll interval must be greater than 0",
            ));
        }

        Ok(())
    }
}
