use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, U256};
use anyhow::anyhow;
use std::str::FromStr;

pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    Address::from_str(s).map_err(|e| anyhow!("invalid address {s}: {e}"))
}

/// Parses a decimal ether amount ("0.1") into wei.
pub fn parse_eth(s: &str) -> anyhow::Result<U256> {
    parse_ether(s.trim()).map_err(|e| anyhow!("invalid ether amount {s}: {e}"))
}

pub fn format_eth(wei: U256) -> String {
    format!("{} ETH", format_ether(wei))
}
