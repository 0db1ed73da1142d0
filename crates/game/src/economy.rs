use alloy::primitives::{uint, U256};

pub const TOWER_COUNT: usize = 8;
pub const MAX_LEVEL: u8 = 5;

/// Coin price of each level of a tower, before the level and tier multipliers.
pub const BASE_PRICE: [u64; TOWER_COUNT] = [200, 400, 600, 800, 1_000, 1_200, 1_400, 1_600];

/// Money per accrual period each level of a tower adds.
pub const BASE_YIELD: [u64; TOWER_COUNT] = [4, 9, 15, 22, 30, 39, 49, 60];

/// Token base units paid per coin of pending reward.
pub const TOKENS_PER_COIN: U256 = uint!(1_000_000_000_000_000_U256);

const REINVEST_BONUS_PERCENT: u64 = 5;
const BUYBACK_DIVISOR: u64 = 10;
const REWARD_DIVISOR: u64 = 10;

/// Price in coins of raising `tower` to `level`. `None` for an unknown tower
/// or a level outside `1..=MAX_LEVEL`.
pub fn upgrade_price(tower: usize, level: u8, tier: u64) -> Option<U256> {
    let base = *BASE_PRICE.get(tower)?;
    if level == 0 || level > MAX_LEVEL {
        return None;
    }
    Some(U256::from(base) * U256::from(level) * U256::from(tier))
}

/// Yield gained by raising `tower` to `level`.
pub fn upgrade_yield(tower: usize, level: u8) -> Option<U256> {
    let base = *BASE_YIELD.get(tower)?;
    if level == 0 || level > MAX_LEVEL {
        return None;
    }
    Some(U256::from(base) * U256::from(level))
}

/// Token reward, in coins, earned by spending `price` coins on an upgrade.
pub fn upgrade_reward(price: U256) -> U256 {
    price / U256::from(REWARD_DIVISOR)
}

/// Coins credited when `money` is reinvested.
pub fn reinvest_credit(money: U256) -> U256 {
    money + money * U256::from(REINVEST_BONUS_PERCENT) / U256::from(100u64)
}

/// Wei sent to the router as buyback when `money` is reinvested.
pub fn reinvest_buyback(money: U256, coins_price: U256) -> U256 {
    money * coins_price / U256::from(BUYBACK_DIVISOR)
}

/// Total coins needed to take every tower from level 0 to `MAX_LEVEL`.
pub fn full_upgrade_cost(tier: u64) -> U256 {
    (0..TOWER_COUNT)
        .flat_map(|tower| (1..=MAX_LEVEL).map(move |level| (tower, level)))
        .filter_map(|(tower, level)| upgrade_price(tower, level, tier))
        .fold(U256::ZERO, |acc, price| acc + price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_scale_with_level_and_tier() {
        assert_eq!(upgrade_price(0, 1, 1), Some(U256::from(200u64)));
        assert_eq!(upgrade_price(7, 5, 1), Some(U256::from(8_000u64)));
        assert_eq!(upgrade_price(1, 3, 2), Some(U256::from(2_400u64)));
        assert_eq!(upgrade_price(8, 1, 1), None);
        assert_eq!(upgrade_price(0, 0, 1), None);
        assert_eq!(upgrade_price(0, 6, 1), None);
    }

    #[test]
    fn yields_scale_with_level() {
        assert_eq!(upgrade_yield(0, 5), Some(U256::from(20u64)));
        assert_eq!(upgrade_yield(7, 1), Some(U256::from(60u64)));
        assert_eq!(upgrade_yield(3, 0), None);
    }

    #[test]
    fn full_upgrade_fits_a_point_two_eth_deposit() {
        // 0.2 ETH at 1e12 wei per coin buys 200_000 coins.
        assert_eq!(full_upgrade_cost(1), U256::from(108_000u64));
    }

    #[test]
    fn reinvest_adds_bonus_and_splits_buyback() {
        assert_eq!(reinvest_credit(U256::from(3_420u64)), U256::from(3_591u64));
        let coins_price = U256::from(1_000_000_000_000u64);
        assert_eq!(
            reinvest_buyback(U256::from(3_420u64), coins_price),
            U256::from(342_000_000_000_000u64)
        );
    }

    #[test]
    fn token_rate_is_a_thousandth_of_a_token_per_coin() {
        assert_eq!(TOKENS_PER_COIN, U256::from(10u64).pow(U256::from(15u64)));
        assert_eq!(upgrade_reward(U256::from(1_600u64)), U256::from(160u64));
    }
}
