use alloy::primitives::{Address, U256};

/// Constructor arguments of the game contract, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    pub tier: u64,
    pub coins_price: U256,
    pub router: Address,
    pub accrual_period_secs: u64,
    pub accrual_cap_periods: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
}

/// ETH each scenario puts into the game before attacking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPlan {
    pub withdraw: U256,
    pub reinvest: U256,
    pub claim: U256,
}
