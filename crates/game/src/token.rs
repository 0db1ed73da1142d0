use alloy::primitives::{uint, Address, U256};
use alloy::sol_types::SolInterface;
use codeup_chain::{encode_return, unit, CallResult, Contract, Msg, Revert, Vm};
use codeup_core::types::TokenParams;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::abi::{ICodeupERC20, ICodeupERC20Receiver};

pub const DECIMALS: u8 = 18;

/// 1,000,000 tokens with 18 decimals.
pub const INITIAL_SUPPLY: U256 = uint!(1_000_000_000_000_000_000_000_000_U256);

#[derive(Debug, Clone)]
pub struct TokenStorage {
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub balances: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
    pub hooks: HashSet<Address>,
}

impl TokenStorage {
    pub fn new(owner: Address, params: &TokenParams) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner, INITIAL_SUPPLY);
        Self {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            total_supply: INITIAL_SUPPLY,
            balances,
            allowances: HashMap::new(),
            hooks: HashSet::new(),
        }
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }
}

/// ERC20 game token. Recipients that opt in through `setTransferHook` are
/// notified with `onCodeupERC20Received` after every transfer to them.
pub struct CodeupERC20;

pub fn deploy_token(vm: &mut Vm, deployer: Address, owner: Address, params: &TokenParams) -> Address {
    vm.deploy(deployer, CodeupERC20, TokenStorage::new(owner, params))
}

impl Contract for CodeupERC20 {
    fn name(&self) -> &'static str {
        "CodeupERC20"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        use ICodeupERC20::ICodeupERC20Calls as Calls;

        msg.ensure_no_value()?;
        let call = Calls::abi_decode(&msg.data).map_err(|_| Revert::empty())?;
        let token = msg.to;
        match call {
            Calls::name(_) => {
                let name = vm.storage::<TokenStorage>(token)?.name.clone();
                Ok(encode_return::<ICodeupERC20::nameCall>(&name))
            }
            Calls::symbol(_) => {
                let symbol = vm.storage::<TokenStorage>(token)?.symbol.clone();
                Ok(encode_return::<ICodeupERC20::symbolCall>(&symbol))
            }
            Calls::decimals(_) => Ok(encode_return::<ICodeupERC20::decimalsCall>(&DECIMALS)),
            Calls::totalSupply(_) => {
                let supply = vm.storage::<TokenStorage>(token)?.total_supply;
                Ok(encode_return::<ICodeupERC20::totalSupplyCall>(&supply))
            }
            Calls::balanceOf(call) => {
                let balance = vm.storage::<TokenStorage>(token)?.balance_of(call.account);
                Ok(encode_return::<ICodeupERC20::balanceOfCall>(&balance))
            }
            Calls::allowance(call) => {
                let allowance = vm
                    .storage::<TokenStorage>(token)?
                    .allowance(call.owner, call.spender);
                Ok(encode_return::<ICodeupERC20::allowanceCall>(&allowance))
            }
            Calls::transferHookEnabled(call) => {
                let enabled = vm
                    .storage::<TokenStorage>(token)?
                    .hooks
                    .contains(&call.account);
                Ok(encode_return::<ICodeupERC20::transferHookEnabledCall>(&enabled))
            }
            Calls::approve(call) => {
                approve(vm, token, msg.sender, call.spender, call.value)?;
                Ok(encode_return::<ICodeupERC20::approveCall>(&true))
            }
            Calls::transfer(call) => {
                transfer(vm, token, msg.sender, call.to, call.value)?;
                Ok(encode_return::<ICodeupERC20::transferCall>(&true))
            }
            Calls::transferFrom(call) => {
                spend_allowance(vm, token, call.from, msg.sender, call.value)?;
                transfer(vm, token, call.from, call.to, call.value)?;
                Ok(encode_return::<ICodeupERC20::transferFromCall>(&true))
            }
            Calls::setTransferHook(call) => {
                let hooks = &mut vm.storage_mut::<TokenStorage>(token)?.hooks;
                if call.enabled {
                    hooks.insert(msg.sender);
                } else {
                    hooks.remove(&msg.sender);
                }
                vm.emit(
                    token,
                    &ICodeupERC20::TransferHookSet {
                        account: msg.sender,
                        enabled: call.enabled,
                    },
                );
                unit()
            }
        }
    }
}

fn approve(
    vm: &mut Vm,
    token: Address,
    owner: Address,
    spender: Address,
    value: U256,
) -> Result<(), Revert> {
    if owner.is_zero() {
        return Err(Revert::with_error(ICodeupERC20::ERC20InvalidApprover {
            approver: owner,
        }));
    }
    if spender.is_zero() {
        return Err(Revert::with_error(ICodeupERC20::ERC20InvalidSpender { spender }));
    }
    vm.storage_mut::<TokenStorage>(token)?
        .allowances
        .insert((owner, spender), value);
    vm.emit(
        token,
        &ICodeupERC20::Approval {
            owner,
            spender,
            value,
        },
    );
    Ok(())
}

fn spend_allowance(
    vm: &mut Vm,
    token: Address,
    owner: Address,
    spender: Address,
    value: U256,
) -> Result<(), Revert> {
    let storage = vm.storage_mut::<TokenStorage>(token)?;
    let current = storage.allowance(owner, spender);
    if current == U256::MAX {
        return Ok(());
    }
    if current < value {
        return Err(Revert::with_error(ICodeupERC20::ERC20InsufficientAllowance {
            spender,
            allowance: current,
            needed: value,
        }));
    }
    storage.allowances.insert((owner, spender), current - value);
    Ok(())
}

fn transfer(
    vm: &mut Vm,
    token: Address,
    from: Address,
    to: Address,
    value: U256,
) -> Result<(), Revert> {
    if from.is_zero() {
        return Err(Revert::with_error(ICodeupERC20::ERC20InvalidSender { sender: from }));
    }
    if to.is_zero() {
        return Err(Revert::with_error(ICodeupERC20::ERC20InvalidReceiver { receiver: to }));
    }

    let storage = vm.storage_mut::<TokenStorage>(token)?;
    let balance = storage.balance_of(from);
    if balance < value {
        return Err(Revert::with_error(ICodeupERC20::ERC20InsufficientBalance {
            sender: from,
            balance,
            needed: value,
        }));
    }
    storage.balances.insert(from, balance - value);
    *storage.balances.entry(to).or_default() += value;
    let notify = storage.hooks.contains(&to);
    vm.emit(token, &ICodeupERC20::Transfer { from, to, value });

    if notify && vm.has_code(to) {
        debug!(%token, %from, %to, %value, "calling transfer hook");
        vm.call_sol(
            token,
            to,
            U256::ZERO,
            &ICodeupERC20Receiver::onCodeupERC20ReceivedCall {
                from,
                amount: value,
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeup_core::config::ChainConfig;

    #[derive(Debug, Clone, Default)]
    struct Received(Vec<(Address, U256)>);

    /// Opts into the hook on any non-hook call; fails the hook when it
    /// already received something.
    struct Receiver;

    impl Contract for Receiver {
        fn name(&self) -> &'static str {
            "Receiver"
        }

        fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
            match ICodeupERC20Receiver::ICodeupERC20ReceiverCalls::abi_decode(&msg.data) {
                Ok(ICodeupERC20Receiver::ICodeupERC20ReceiverCalls::onCodeupERC20Received(call)) => {
                    let received = &mut vm.storage_mut::<Received>(msg.to)?.0;
                    if !received.is_empty() {
                        return Err(Revert::with_reason("only once"));
                    }
                    received.push((call.from, call.amount));
                    unit()
                }
                Err(_) => {
                    let token = Address::from_slice(&msg.data[12..32]);
                    vm.call_sol(
                        msg.to,
                        token,
                        U256::ZERO,
                        &ICodeupERC20::setTransferHookCall { enabled: true },
                    )?;
                    unit()
                }
            }
        }
    }

    fn params() -> TokenParams {
        TokenParams {
            name: "GT".to_string(),
            symbol: "GT".to_string(),
        }
    }

    fn setup() -> (Vm, Address, Address) {
        let mut vm = Vm::new(&ChainConfig::default()).unwrap();
        let owner = vm.accounts()[0];
        let token = deploy_token(&mut vm, owner, owner, &params());
        (vm, owner, token)
    }

    fn balance(vm: &mut Vm, token: Address, account: Address) -> U256 {
        vm.view_sol(token, &ICodeupERC20::balanceOfCall { account }).unwrap()
    }

    #[test]
    fn owner_receives_the_initial_supply() {
        let (mut vm, owner, token) = setup();
        assert_eq!(
            INITIAL_SUPPLY,
            U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(balance(&mut vm, token, owner), INITIAL_SUPPLY);
        assert_eq!(vm.view_sol(token, &ICodeupERC20::symbolCall {}).unwrap(), "GT");
        assert_eq!(vm.view_sol(token, &ICodeupERC20::decimalsCall {}).unwrap(), 18);
    }

    #[test]
    fn transfer_moves_balance_and_rejects_overdraft() {
        let (mut vm, owner, token) = setup();
        let alice = vm.accounts()[1];
        let receipt = vm
            .transact_sol(
                owner,
                token,
                U256::ZERO,
                &ICodeupERC20::transferCall {
                    to: alice,
                    value: U256::from(500u64),
                },
            )
            .unwrap();
        assert_eq!(receipt.logs_of::<ICodeupERC20::Transfer>().len(), 1);
        assert_eq!(balance(&mut vm, token, alice), U256::from(500u64));

        let failure = vm
            .transact_sol(
                alice,
                token,
                U256::ZERO,
                &ICodeupERC20::transferCall {
                    to: owner,
                    value: U256::from(501u64),
                },
            )
            .unwrap_err();
        let err = failure
            .revert
            .decode::<ICodeupERC20::ERC20InsufficientBalance>()
            .unwrap();
        assert_eq!(err.balance, U256::from(500u64));
        assert_eq!(err.needed, U256::from(501u64));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let (mut vm, owner, token) = setup();
        let spender = vm.accounts()[1];
        let sink = vm.accounts()[2];
        vm.transact_sol(
            owner,
            token,
            U256::ZERO,
            &ICodeupERC20::approveCall {
                spender,
                value: U256::from(100u64),
            },
        )
        .unwrap();
        let pull = |value: u64| ICodeupERC20::transferFromCall {
            from: owner,
            to: sink,
            value: U256::from(value),
        };
        vm.transact_sol(spender, token, U256::ZERO, &pull(60)).unwrap();
        let failure = vm
            .transact_sol(spender, token, U256::ZERO, &pull(60))
            .unwrap_err();
        assert!(failure
            .revert
            .is::<ICodeupERC20::ERC20InsufficientAllowance>());
        assert_eq!(balance(&mut vm, token, sink), U256::from(60u64));
    }

    #[test]
    fn hook_runs_after_transfer_and_its_revert_bubbles() {
        let (mut vm, owner, token) = setup();
        let receiver = vm.deploy(owner, Receiver, Received::default());
        let mut opt_in = vec![0u8; 32];
        opt_in[12..].copy_from_slice(token.as_slice());
        vm.transact(codeup_chain::Tx {
            from: owner,
            to: receiver,
            value: U256::ZERO,
            data: opt_in.into(),
        })
        .unwrap();
        assert!(vm
            .view_sol(
                token,
                &ICodeupERC20::transferHookEnabledCall { account: receiver }
            )
            .unwrap());

        let send = ICodeupERC20::transferCall {
            to: receiver,
            value: U256::from(7u64),
        };
        vm.transact_sol(owner, token, U256::ZERO, &send).unwrap();
        let received = vm.storage::<Received>(receiver).unwrap().0.clone();
        assert_eq!(received, vec![(owner, U256::from(7u64))]);

        let failure = vm.transact_sol(owner, token, U256::ZERO, &send).unwrap_err();
        assert_eq!(failure.revert.reason().as_deref(), Some("only once"));
        assert_eq!(balance(&mut vm, token, receiver), U256::from(7u64));
    }
}
