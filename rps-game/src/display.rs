use crate::{GameError, Result};
use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::{Address, U256};
use chrono::DateTime;

/// `0x1234...abcd`, or `Waiting...` for an empty seat
pub fn format_address(address: Address) -> String {
    if address == Address::ZERO {
        return "Waiting...".to_string();
    }

    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn format_timestamp(timestamp: u64) -> String {
    if timestamp == 0 {
        return "N/A".to_string();
    }

    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Wei rendered in ether without trailing zeros
pub fn format_stake(wei: U256) -> String {
    let ether = format_ether(wei);
    if ether.contains('.') {
        ether.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        ether
    }
}

/// Parse an ether amount like `0.01` into wei
pub fn parse_stake(input: &str) -> Result<U256> {
    let wei = parse_ether(input.trim())
        .map_err(|e| GameError::InvalidStake(format!("'{}': {}", input, e)))?;

    if wei.is_zero() {
        return Err(GameError::InvalidStake(
            "Stake must be greater than zero".to_string(),
        ));
    }

    Ok(wei)
}
