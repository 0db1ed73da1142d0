use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolInterface};
use codeup_chain::{unit, CallResult, Contract, Msg, Revert, Vm};
use codeup_game::abi::{ICodeup, ICodeupERC20, ICodeupERC20Receiver};
use tracing::debug;

use crate::abi::IClaimCodeupERC20Reentrancy;
use crate::state::{common_call, reenter, AttackContext};

/// Re-enters `claimCodeupERC20` from the router swap callback or from the
/// token transfer hook, whichever payout path the game takes.
pub struct ClaimCodeupERC20Reentrancy;

pub fn deploy_claim_attacker(vm: &mut Vm, deployer: Address) -> Address {
    vm.deploy(deployer, ClaimCodeupERC20Reentrancy, AttackContext::default())
}

fn claim_for_self(this: Address) -> Bytes {
    ICodeup::claimCodeupERC20Call { recipient: this }
        .abi_encode()
        .into()
}

impl Contract for ClaimCodeupERC20Reentrancy {
    fn name(&self) -> &'static str {
        "ClaimCodeupERC20Reentrancy"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        use IClaimCodeupERC20Reentrancy::IClaimCodeupERC20ReentrancyCalls as Calls;
        use ICodeupERC20Receiver::ICodeupERC20ReceiverCalls as HookCalls;

        let this = msg.to;
        if msg.is_transfer() {
            return reenter(vm, this, claim_for_self(this));
        }
        if let Ok(HookCalls::onCodeupERC20Received(call)) = HookCalls::abi_decode(&msg.data) {
            debug!(attacker = %this, token = %msg.sender, from = %call.from, amount = %call.amount, "token hook");
            return reenter(vm, this, claim_for_self(this));
        }
        if let Some(result) = common_call(vm, msg) {
            return result;
        }
        msg.ensure_no_value()?;
        match Calls::abi_decode(&msg.data).map_err(|_| Revert::empty())? {
            Calls::setCodeup(call) => {
                vm.storage_mut::<AttackContext>(this)?.arm(call.codeup);
                debug!(attacker = %this, codeup = %call.codeup, "claim attacker armed");
                unit()
            }
            Calls::enableTransferHook(call) => {
                vm.call_sol(
                    this,
                    call.token,
                    U256::ZERO,
                    &ICodeupERC20::setTransferHookCall { enabled: true },
                )?;
                unit()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::IReentrancyAttacker;
    use crate::testing::{env, eth_milli, Env};
    use codeup_game::abi::ReentrancyGuardReentrantCall;
    use codeup_game::economy::TOKENS_PER_COIN;
    use codeup_game::token::INITIAL_SUPPLY;

    /// Game behind a router that calls back into the armed attacker, every
    /// tower maxed with 0.2 ETH. `treasury` moves the whole token supply
    /// into the game so claims pay out through the token.
    fn prepared(treasury: bool, absorb: bool) -> (Env, Address, Address) {
        let mut env = env();
        let attacker = deploy_claim_attacker(&mut env.vm, env.deployer);
        let game = env.routed_game(attacker);
        let from = env.deployer;
        let token = env.token;
        env.vm
            .transact_sol(
                from,
                attacker,
                U256::ZERO,
                &IClaimCodeupERC20Reentrancy::setCodeupCall { codeup: game },
            )
            .unwrap();
        if treasury {
            env.vm
                .transact_sol(
                    from,
                    token,
                    U256::ZERO,
                    &ICodeupERC20::transferCall {
                        to: game,
                        value: INITIAL_SUPPLY,
                    },
                )
                .unwrap();
            env.vm
                .transact_sol(
                    from,
                    attacker,
                    U256::ZERO,
                    &IClaimCodeupERC20Reentrancy::enableTransferHookCall { token },
                )
                .unwrap();
        }
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
        env.max_out(game, eth_milli(200));
        (env, game, attacker)
    }

    #[test]
    fn reentrant_claim_is_rejected_through_the_router() {
        let (mut env, game, attacker) = prepared(false, false);
        let recipient = env.deployer;
        let failure = env
            .vm
            .transact_sol(
                env.deployer,
                game,
                U256::ZERO,
                &ICodeup::claimCodeupERC20Call { recipient },
            )
            .unwrap_err();
        assert!(failure.revert.is::<ReentrancyGuardReentrantCall>());
        let claims = failure.trace.calls_of::<ICodeup::claimCodeupERC20Call>(game);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[1].caller, attacker);

        let pending = env
            .vm
            .view_sol(game, &ICodeup::pendingCodeupERC20Call { user: env.deployer })
            .unwrap();
        assert_eq!(pending, U256::from(10_800u64));
    }

    #[test]
    fn reentrant_claim_is_rejected_through_the_token_hook() {
        let (mut env, game, attacker) = prepared(true, false);
        let failure = env
            .vm
            .transact_sol(
                env.deployer,
                game,
                U256::ZERO,
                &ICodeup::claimCodeupERC20Call {
                    recipient: attacker,
                },
            )
            .unwrap_err();
        assert!(failure.revert.is::<ReentrancyGuardReentrantCall>());
        let hooks = failure
            .trace
            .calls_of::<ICodeupERC20Receiver::onCodeupERC20ReceivedCall>(attacker);
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].caller, env.token);
    }

    #[test]
    fn absorbed_hook_reentry_claims_once() {
        let (mut env, game, attacker) = prepared(true, true);
        let receipt = env
            .vm
            .transact_sol(
                env.deployer,
                game,
                U256::ZERO,
                &ICodeup::claimCodeupERC20Call {
                    recipient: attacker,
                },
            )
            .unwrap();
        let claimed = receipt.logs_of::<ICodeup::ClaimCodeupERC20>();
        assert_eq!(claimed.len(), 1);
        assert!(!claimed[0].swapped);

        let balance = env
            .vm
            .view_sol(env.token, &ICodeupERC20::balanceOfCall { account: attacker })
            .unwrap();
        assert_eq!(balance, U256::from(10_800u64) * TOKENS_PER_COIN);
        let attempts = env
            .vm
            .view_sol(attacker, &IReentrancyAttacker::reentryAttemptsCall {})
            .unwrap();
        assert_eq!(attempts, U256::from(1u64));
    }
}
