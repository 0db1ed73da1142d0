use alloy::primitives::{Address, U256};
use alloy::sol_types::{SolCall, SolInterface};
use codeup_chain::{CallResult, Contract, Msg, Revert, Vm};
use codeup_game::abi::ICodeup;

use crate::abi::IWithdrawReentrance;
use crate::state::{common_call, forward, reenter, AttackContext};

/// Plays the game as a normal account, then re-enters `withdraw` from the
/// `receive` hook the payout lands in.
pub struct WithdrawReentrance;

pub fn deploy_withdraw_attacker(vm: &mut Vm, deployer: Address, codeup: Address) -> Address {
    vm.deploy(deployer, WithdrawReentrance, AttackContext::armed(codeup))
}

impl Contract for WithdrawReentrance {
    fn name(&self) -> &'static str {
        "WithdrawReentrance"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        use IWithdrawReentrance::IWithdrawReentranceCalls as Calls;

        let this = msg.to;
        if msg.is_transfer() {
            return reenter(vm, this, ICodeup::withdrawCall {}.abi_encode().into());
        }
        if let Some(result) = common_call(vm, msg) {
            return result;
        }
        let call = Calls::abi_decode(&msg.data).map_err(|_| Revert::empty())?;
        if !matches!(call, Calls::addTokens(_)) {
            msg.ensure_no_value()?;
        }
        match call {
            Calls::addTokens(_) => forward(vm, this, msg.value, &ICodeup::addGameETHCall {}),
            Calls::upgrade(call) => forward(
                vm,
                this,
                U256::ZERO,
                &ICodeup::upgradeTowerCall {
                    towerId: call.towerId,
                },
            ),
            Calls::collect(_) => forward(vm, this, U256::ZERO, &ICodeup::collectCall {}),
            Calls::withdraw(_) => forward(vm, this, U256::ZERO, &ICodeup::withdrawCall {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::IReentrancyAttacker;
    use crate::state::AttackState;
    use crate::testing::{env, eth_milli, Env, COINS_PRICE};
    use alloy::primitives::address;
    use alloy::sol_types::SolError;
    use codeup_game::abi::ReentrancyGuardReentrantCall;

    const UNUSED_ROUTER: Address = address!("0x4752ba5dbc23f44d87826276bf6fd6b1c372ad24");

    /// Attacker funded with 0.1 ETH, towers 0 and 1 maxed, one hour collected.
    fn played(absorb: bool) -> (Env, Address, Address) {
        let mut env = env();
        let game = env.game(UNUSED_ROUTER);
        let attacker = deploy_withdraw_attacker(&mut env.vm, env.deployer, game);
        let from = env.deployer;
        if absorb {
            env.vm
                .transact_sol(
                    from,
                    attacker,
                    U256::ZERO,
                    &IReentrancyAttacker::setAbsorbFailuresCall { absorb: true },
                )
                .unwrap();
        }
        env.vm
            .transact_sol(from, attacker, eth_milli(100), &IWithdrawReentrance::addTokensCall {})
            .unwrap();
        for tower in [0u64, 1] {
            for _ in 0..5 {
                let upgrade = IWithdrawReentrance::upgradeCall {
                    towerId: U256::from(tower),
                };
                env.vm.transact_sol(from, attacker, U256::ZERO, &upgrade).unwrap();
            }
        }
        env.vm.increase_time(3_600);
        env.vm
            .transact_sol(from, attacker, U256::ZERO, &IWithdrawReentrance::collectCall {})
            .unwrap();
        (env, game, attacker)
    }

    #[test]
    fn armed_at_construction() {
        let (mut env, _, attacker) = played(false);
        let state = env
            .vm
            .view_sol(attacker, &IReentrancyAttacker::attackStateCall {})
            .unwrap();
        assert_eq!(AttackState::from_u8(state), Some(AttackState::Armed));
    }

    #[test]
    fn reentrant_withdraw_is_rejected() {
        let (mut env, game, attacker) = played(false);
        let failure = env
            .vm
            .transact_sol(env.deployer, attacker, U256::ZERO, &IWithdrawReentrance::withdrawCall {})
            .unwrap_err();
        assert!(failure.revert.is::<ICodeup::EthTransferFailed>());

        let nested = failure.trace.reverts_with::<ReentrancyGuardReentrantCall>();
        assert!(!nested.is_empty());
        assert_eq!(nested[0].target, game);
        assert_eq!(nested[0].caller, attacker);
        assert!(nested[0].is_call::<ICodeup::withdrawCall>());

        assert!(!env
            .vm
            .view_sol(game, &ICodeup::reentrancyGuardEnteredCall {})
            .unwrap());
        let tower = env
            .vm
            .view_sol(game, &ICodeup::towerOfCall { user: attacker })
            .unwrap();
        assert_eq!(tower.money2, U256::from(195u64));
        assert_eq!(env.vm.balance(attacker), U256::ZERO);
    }

    #[test]
    fn absorbed_reentry_pays_out_once() {
        let (mut env, game, attacker) = played(true);
        let game_before = env.vm.balance(game);
        env.vm
            .transact_sol(env.deployer, attacker, U256::ZERO, &IWithdrawReentrance::withdrawCall {})
            .unwrap();

        let payout = U256::from(195u64) * COINS_PRICE;
        assert_eq!(env.vm.balance(attacker), payout);
        assert_eq!(game_before - env.vm.balance(game), payout);

        let attempts = env
            .vm
            .view_sol(attacker, &IReentrancyAttacker::reentryAttemptsCall {})
            .unwrap();
        assert_eq!(attempts, U256::from(1u64));
        let state = env
            .vm
            .view_sol(attacker, &IReentrancyAttacker::attackStateCall {})
            .unwrap();
        assert_eq!(AttackState::from_u8(state), Some(AttackState::Settled));
        let last = env
            .vm
            .view_sol(attacker, &IReentrancyAttacker::lastReentryErrorCall {})
            .unwrap();
        assert_eq!(last.to_vec(), ReentrancyGuardReentrantCall {}.abi_encode());
    }

    #[test]
    fn forwarding_without_value_rules() {
        let (mut env, _, attacker) = played(false);
        let failure = env
            .vm
            .transact_sol(env.deployer, attacker, U256::from(1u64), &IWithdrawReentrance::collectCall {})
            .unwrap_err();
        assert!(failure.revert.is_empty());
    }
}
