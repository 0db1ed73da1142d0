use alloy::sol_types::SolError;
use codeup_chain::Revert;
use codeup_dex::abi::{ITestFactory, ITestRouter};

use crate::abi::{ICodeup, ICodeupERC20, ReentrancyGuardReentrantCall};

fn entry<E: SolError>() -> ([u8; 4], &'static str) {
    (E::SELECTOR, E::SIGNATURE)
}

/// Selector and signature of every custom error the deployed contracts
/// can revert with.
pub fn known_errors() -> Vec<([u8; 4], &'static str)> {
    vec![
        entry::<ReentrancyGuardReentrantCall>(),
        entry::<ICodeup::InvalidConfiguration>(),
        entry::<ICodeup::ZeroValue>(),
        entry::<ICodeup::InvalidTower>(),
        entry::<ICodeup::InvalidLevel>(),
        entry::<ICodeup::MaxLevelReached>(),
        entry::<ICodeup::InsufficientCoins>(),
        entry::<ICodeup::NothingToCollect>(),
        entry::<ICodeup::NothingToWithdraw>(),
        entry::<ICodeup::NothingToReinvest>(),
        entry::<ICodeup::NothingToClaim>(),
        entry::<ICodeup::InsufficientGameBalance>(),
        entry::<ICodeup::EthTransferFailed>(),
        entry::<ICodeupERC20::ERC20InsufficientBalance>(),
        entry::<ICodeupERC20::ERC20InsufficientAllowance>(),
        entry::<ICodeupERC20::ERC20InvalidSender>(),
        entry::<ICodeupERC20::ERC20InvalidReceiver>(),
        entry::<ICodeupERC20::ERC20InvalidApprover>(),
        entry::<ICodeupERC20::ERC20InvalidSpender>(),
        entry::<ITestRouter::Expired>(),
        entry::<ITestRouter::InvalidPath>(),
        entry::<ITestRouter::InsufficientOutputAmount>(),
        entry::<ITestFactory::Unauthorized>(),
        entry::<ITestFactory::CodeupNotSet>(),
        entry::<ITestFactory::IdenticalAddresses>(),
        entry::<ITestFactory::ZeroAddress>(),
        entry::<ITestFactory::PairExists>(),
    ]
}

pub fn describe(revert: &Revert) -> String {
    revert.describe_with(&known_errors())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use std::collections::HashSet;

    #[test]
    fn selectors_are_unique() {
        let errors = known_errors();
        let selectors: HashSet<[u8; 4]> = errors.iter().map(|(selector, _)| *selector).collect();
        assert_eq!(selectors.len(), errors.len());
    }

    #[test]
    fn describes_game_errors_by_signature() {
        let revert = Revert::with_error(ReentrancyGuardReentrantCall {});
        assert_eq!(describe(&revert), "ReentrancyGuardReentrantCall()");
        let revert = Revert::with_error(ICodeup::EthTransferFailed {
            to: Address::ZERO,
            value: U256::from(1u64),
        });
        assert_eq!(describe(&revert), "EthTransferFailed(address,uint256)");
    }
}
