use alloy::primitives::{Address, U256};
use alloy::sol_types::SolInterface;
use codeup_chain::{encode_return, unit, CallResult, Contract, Msg, Revert, Vm};
use std::collections::HashMap;
use tracing::debug;

use crate::abi::{ITestFactory, IUniswapV2Factory};
use crate::pair::{derive_pair_address_v2, sort_tokens, UNISWAP_V2_INIT_CODE_HASH};

#[derive(Debug, Clone)]
pub struct FactoryStorage {
    pub owner: Address,
    pub codeup: Address,
    pub pairs: HashMap<(Address, Address), Address>,
    pub all_pairs: Vec<Address>,
}

impl FactoryStorage {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            codeup: Address::ZERO,
            pairs: HashMap::new(),
            all_pairs: Vec::new(),
        }
    }

    pub fn pair(&self, token_a: Address, token_b: Address) -> Address {
        self.pairs
            .get(&sort_tokens(token_a, token_b))
            .copied()
            .unwrap_or(Address::ZERO)
    }
}

/// Minimal V2 factory that only hands out pairs once the game it serves
/// has been registered.
pub struct TestFactory;

pub fn deploy_factory(vm: &mut Vm, deployer: Address) -> Address {
    vm.deploy(deployer, TestFactory, FactoryStorage::new(deployer))
}

impl Contract for TestFactory {
    fn name(&self) -> &'static str {
        "TestFactory"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        msg.ensure_no_value()?;
        if let Ok(call) = IUniswapV2Factory::IUniswapV2FactoryCalls::abi_decode(&msg.data) {
            return self.factory_call(vm, msg, call);
        }
        match ITestFactory::ITestFactoryCalls::abi_decode(&msg.data) {
            Ok(call) => self.admin_call(vm, msg, call),
            Err(_) => Err(Revert::empty()),
        }
    }
}

impl TestFactory {
    fn factory_call(
        &self,
        vm: &mut Vm,
        msg: &Msg,
        call: IUniswapV2Factory::IUniswapV2FactoryCalls,
    ) -> CallResult {
        use IUniswapV2Factory::IUniswapV2FactoryCalls as Calls;

        match call {
            Calls::getPair(call) => {
                let pair = vm
                    .storage::<FactoryStorage>(msg.to)?
                    .pair(call.tokenA, call.tokenB);
                Ok(encode_return::<IUniswapV2Factory::getPairCall>(&pair))
            }
            Calls::allPairsLength(_) => {
                let len = vm.storage::<FactoryStorage>(msg.to)?.all_pairs.len();
                Ok(encode_return::<IUniswapV2Factory::allPairsLengthCall>(
                    &U256::from(len),
                ))
            }
            Calls::createPair(call) => {
                let pair = create_pair(vm, msg.to, call.tokenA, call.tokenB)?;
                Ok(encode_return::<IUniswapV2Factory::createPairCall>(&pair))
            }
        }
    }

    fn admin_call(
        &self,
        vm: &mut Vm,
        msg: &Msg,
        call: ITestFactory::ITestFactoryCalls,
    ) -> CallResult {
        use ITestFactory::ITestFactoryCalls as Calls;

        match call {
            Calls::codeup(_) => {
                let codeup = vm.storage::<FactoryStorage>(msg.to)?.codeup;
                Ok(encode_return::<ITestFactory::codeupCall>(&codeup))
            }
            Calls::setCodeup(call) => {
                let storage = vm.storage_mut::<FactoryStorage>(msg.to)?;
                if msg.sender != storage.owner {
                    return Err(Revert::with_error(ITestFactory::Unauthorized {
                        caller: msg.sender,
                    }));
                }
                storage.codeup = call.codeup;
                debug!(factory = %msg.to, codeup = %call.codeup, "factory bound to game");
                unit()
            }
        }
    }
}

fn create_pair(
    vm: &mut Vm,
    factory: Address,
    token_a: Address,
    token_b: Address,
) -> Result<Address, Revert> {
    let storage = vm.storage_mut::<FactoryStorage>(factory)?;
    if storage.codeup.is_zero() {
        return Err(Revert::with_error(ITestFactory::CodeupNotSet {}));
    }
    if token_a == token_b {
        return Err(Revert::with_error(ITestFactory::IdenticalAddresses {}));
    }
    let (token0, token1) = sort_tokens(token_a, token_b);
    if token0.is_zero() {
        return Err(Revert::with_error(ITestFactory::ZeroAddress {}));
    }
    if let Some(pair) = storage.pairs.get(&(token0, token1)) {
        return Err(Revert::with_error(ITestFactory::PairExists { pair: *pair }));
    }

    let pair = derive_pair_address_v2(factory, token0, token1, UNISWAP_V2_INIT_CODE_HASH);
    storage.pairs.insert((token0, token1), pair);
    storage.all_pairs.push(pair);
    let index = U256::from(storage.all_pairs.len());
    vm.emit(
        factory,
        &IUniswapV2Factory::PairCreated {
            token0,
            token1,
            pair,
            index,
        },
    );
    debug!(%factory, %token0, %token1, %pair, "pair created");
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use codeup_core::config::ChainConfig;

    const TOKEN_A: Address = address!("0x00000000000000000000000000000000000000aa");
    const TOKEN_B: Address = address!("0x00000000000000000000000000000000000000bb");

    fn setup() -> (Vm, Address, Address) {
        let mut vm = Vm::new(&ChainConfig::default()).unwrap();
        let owner = vm.accounts()[0];
        let factory = deploy_factory(&mut vm, owner);
        (vm, owner, factory)
    }

    #[test]
    fn create_pair_requires_a_registered_game() {
        let (mut vm, owner, factory) = setup();
        let failure = vm
            .transact_sol(
                owner,
                factory,
                U256::ZERO,
                &IUniswapV2Factory::createPairCall {
                    tokenA: TOKEN_A,
                    tokenB: TOKEN_B,
                },
            )
            .unwrap_err();
        assert!(failure.revert.is::<ITestFactory::CodeupNotSet>());
    }

    #[test]
    fn only_owner_registers_the_game() {
        let (mut vm, owner, factory) = setup();
        let stranger = vm.accounts()[1];
        let game = vm.accounts()[2];
        let failure = vm
            .transact_sol(
                stranger,
                factory,
                U256::ZERO,
                &ITestFactory::setCodeupCall { codeup: game },
            )
            .unwrap_err();
        assert!(failure.revert.is::<ITestFactory::Unauthorized>());

        vm.transact_sol(
            owner,
            factory,
            U256::ZERO,
            &ITestFactory::setCodeupCall { codeup: game },
        )
        .unwrap();
        assert_eq!(vm.view_sol(factory, &ITestFactory::codeupCall {}).unwrap(), game);
    }

    #[test]
    fn pairs_use_the_create2_address_and_are_unique() {
        let (mut vm, owner, factory) = setup();
        let game = vm.accounts()[2];
        vm.transact_sol(
            owner,
            factory,
            U256::ZERO,
            &ITestFactory::setCodeupCall { codeup: game },
        )
        .unwrap();

        let create = IUniswapV2Factory::createPairCall {
            tokenA: TOKEN_B,
            tokenB: TOKEN_A,
        };
        let receipt = vm.transact_sol(owner, factory, U256::ZERO, &create).unwrap();
        let pair = receipt.decode::<IUniswapV2Factory::createPairCall>().unwrap();
        assert_eq!(
            pair,
            derive_pair_address_v2(factory, TOKEN_A, TOKEN_B, UNISWAP_V2_INIT_CODE_HASH)
        );
        let created = receipt.logs_of::<IUniswapV2Factory::PairCreated>();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].token0, TOKEN_A);

        let lookup = IUniswapV2Factory::getPairCall {
            tokenA: TOKEN_A,
            tokenB: TOKEN_B,
        };
        assert_eq!(vm.view_sol(factory, &lookup).unwrap(), pair);
        assert_eq!(
            vm.view_sol(factory, &IUniswapV2Factory::allPairsLengthCall {})
                .unwrap(),
            U256::from(1u64)
        );

        let failure = vm.transact_sol(owner, factory, U256::ZERO, &create).unwrap_err();
        assert!(failure.revert.is::<ITestFactory::PairExists>());
    }
}
