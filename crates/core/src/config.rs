use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::modes::FailureMode;
use crate::types::{DeployParams, FundingPlan, TokenParams};
use crate::utils::{parse_address, parse_eth};

const MAX_TIER: u64 = 10;

/// Deepest nesting the VM accepts. Nested calls run on the host thread's
/// stack, so the limit stays well below the EVM's 1024.
pub const MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub scenarios: ScenarioConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_accounts")]
    pub accounts: usize,
    #[serde(default = "default_account_balance_eth")]
    pub account_balance_eth: String,
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_tier")]
    pub tier: u64,
    #[serde(default = "default_coins_price_eth")]
    pub coins_price_eth: String,
    #[serde(default = "default_router")]
    pub router: String,
    #[serde(default = "default_accrual_period_secs")]
    pub accrual_period_secs: u64,
    #[serde(default = "default_accrual_cap_periods")]
    pub accrual_cap_periods: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_name")]
    pub name: String,
    #[serde(default = "default_token_symbol")]
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_withdraw_funding_eth")]
    pub withdraw_funding_eth: String,
    #[serde(default = "default_game_funding_eth")]
    pub reinvest_funding_eth: String,
    #[serde(default = "default_game_funding_eth")]
    pub claim_funding_eth: String,
    #[serde(default = "default_upgrade_rounds")]
    pub upgrade_rounds: u64,
    #[serde(default = "default_time_advance_secs")]
    pub time_advance_secs: u64,
    #[serde(default = "default_failure_mode")]
    pub failure_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    /// Loads a config file and layers `CODEUP__SECTION__KEY` environment
    /// overrides on top of it.
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("CODEUP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let cfg: Self = cfg.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;
        let cfg: Self = cfg.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.game.deploy_params()?;
        self.scenarios.funding()?;
        FailureMode::parse(&self.scenarios.failure_mode)?;
        self.chain.validate()
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.accounts == 0 {
            return Err(Error::invalid("chain.accounts", "at least one account is required"));
        }
        if self.max_call_depth == 0 || self.max_call_depth > MAX_CALL_DEPTH {
            return Err(Error::invalid(
                "chain.max_call_depth",
                format!("{} is outside 1..={MAX_CALL_DEPTH}", self.max_call_depth),
            ));
        }
        Ok(())
    }
}

impl GameConfig {
    pub fn deploy_params(&self) -> Result<DeployParams> {
        if self.tier == 0 || self.tier > MAX_TIER {
            return Err(Error::invalid(
                "game.tier",
                format!("{} is outside 1..={MAX_TIER}", self.tier),
            ));
        }
        let coins_price = parse_eth(&self.coins_price_eth)?;
        if coins_price.is_zero() {
            return Err(Error::invalid("game.coins_price_eth", "must be non-zero"));
        }
        if self.accrual_period_secs == 0 {
            return Err(Error::invalid("game.accrual_period_secs", "must be positive"));
        }
        Ok(DeployParams {
            tier: self.tier,
            coins_price,
            router: parse_address(&self.router)?,
            accrual_period_secs: self.accrual_period_secs,
            accrual_cap_periods: self.accrual_cap_periods,
        })
    }
}

impl TokenConfig {
    pub fn params(&self) -> TokenParams {
        TokenParams {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
        }
    }
}

impl ScenarioConfig {
    pub fn funding(&self) -> Result<FundingPlan> {
        Ok(FundingPlan {
            withdraw: parse_eth(&self.withdraw_funding_eth)?,
            reinvest: parse_eth(&self.reinvest_funding_eth)?,
            claim: parse_eth(&self.claim_funding_eth)?,
        })
    }

    pub fn failure_mode(&self) -> Result<FailureMode> {
        FailureMode::parse(&self.failure_mode)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            account_balance_eth: default_account_balance_eth(),
            genesis_timestamp: default_genesis_timestamp(),
            block_time_secs: default_block_time_secs(),
            max_call_depth: default_max_call_depth(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tier: default_tier(),
            coins_price_eth: default_coins_price_eth(),
            router: default_router(),
            accrual_period_secs: default_accrual_period_secs(),
            accrual_cap_periods: default_accrual_cap_periods(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            symbol: default_token_symbol(),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            withdraw_funding_eth: default_withdraw_funding_eth(),
            reinvest_funding_eth: default_game_funding_eth(),
            claim_funding_eth: default_game_funding_eth(),
            upgrade_rounds: default_upgrade_rounds(),
            time_advance_secs: default_time_advance_secs(),
            failure_mode: default_failure_mode(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            log_level: default_log_level(),
        }
    }
}

fn default_accounts() -> usize {
    20
}

fn default_account_balance_eth() -> String {
    "10000".to_string()
}

fn default_genesis_timestamp() -> u64 {
    1_700_000_000
}

fn default_block_time_secs() -> u64 {
    1
}

fn default_max_call_depth() -> usize {
    MAX_CALL_DEPTH
}

fn default_tier() -> u64 {
    1
}

fn default_coins_price_eth() -> String {
    "0.000001".to_string()
}

fn default_router() -> String {
    "0x4752ba5dbc23f44d87826276bf6fd6b1c372ad24".to_string()
}

fn default_accrual_period_secs() -> u64 {
    3_600
}

fn default_accrual_cap_periods() -> u64 {
    24
}

fn default_token_name() -> String {
    "GT".to_string()
}

fn default_token_symbol() -> String {
    "GT".to_string()
}

fn default_withdraw_funding_eth() -> String {
    "0.1".to_string()
}

fn default_game_funding_eth() -> String {
    "0.2".to_string()
}

fn default_upgrade_rounds() -> u64 {
    5
}

fn default_time_advance_secs() -> u64 {
    3_600
}

fn default_failure_mode() -> String {
    "propagate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    #[test]
    fn empty_file_yields_documented_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        let params = cfg.game.deploy_params().unwrap();
        assert_eq!(params.tier, 1);
        assert_eq!(params.coins_price, U256::from(1_000_000_000_000u64));
        assert_eq!(
            params.router,
            address!("0x4752ba5dbc23f44d87826276bf6fd6b1c372ad24")
        );
        assert_eq!(cfg.scenarios.time_advance_secs, 3_600);
        assert_eq!(cfg.scenarios.upgrade_rounds, 5);
        assert_eq!(cfg.token.symbol, "GT");
        assert_eq!(cfg.chain.max_call_depth, MAX_CALL_DEPTH);
    }

    #[test]
    fn sections_override_defaults() {
        let raw = r#"
            [game]
            tier = 2
            coins_price_eth = "0.00001"

            [scenarios]
            withdraw_funding_eth = "0.5"
            failure_mode = "absorb"
        "#;
        let cfg = AppConfig::from_toml_str(raw).unwrap();
        assert_eq!(cfg.game.tier, 2);
        let funding = cfg.scenarios.funding().unwrap();
        assert_eq!(funding.withdraw, U256::from(500_000_000_000_000_000u64));
        assert_eq!(funding.claim, U256::from(200_000_000_000_000_000u64));
        assert_eq!(cfg.scenarios.failure_mode().unwrap(), FailureMode::Absorb);
    }

    #[test]
    fn rejects_out_of_range_tier() {
        let err = AppConfig::from_toml_str("[game]\ntier = 0\n").unwrap_err();
        assert!(err.to_string().contains("game.tier"));
    }

    #[test]
    fn rejects_zero_coins_price() {
        let err = AppConfig::from_toml_str("[game]\ncoins_price_eth = \"0\"\n").unwrap_err();
        assert!(err.to_string().contains("coins_price_eth"));
    }

    #[test]
    fn rejects_call_depth_beyond_host_stack() {
        let err = AppConfig::from_toml_str("[chain]\nmax_call_depth = 1024\n").unwrap_err();
        assert!(err.to_string().contains("chain.max_call_depth"));
        assert!(AppConfig::from_toml_str("[chain]\nmax_call_depth = 0\n").is_err());
        assert!(AppConfig::from_toml_str("[chain]\nmax_call_depth = 256\n").is_ok());
    }

    #[test]
    fn rejects_unknown_failure_mode() {
        assert!(AppConfig::from_toml_str("[scenarios]\nfailure_mode = \"ignore\"\n").is_err());
    }
}
