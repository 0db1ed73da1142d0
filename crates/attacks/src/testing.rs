use alloy::primitives::{Address, U256};
use codeup_chain::Vm;
use codeup_core::config::ChainConfig;
use codeup_core::types::{DeployParams, TokenParams};
use codeup_dex::abi::ITestFactory;
use codeup_dex::{deploy_factory, deploy_router};
use codeup_game::abi::ICodeup;
use codeup_game::{deploy_codeup, deploy_token};

pub const COINS_PRICE: U256 = U256::from_limbs([1_000_000_000_000, 0, 0, 0]);

pub fn eth_milli(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000_000_000u64)
}

pub struct Env {
    pub vm: Vm,
    pub deployer: Address,
    pub token: Address,
}

pub fn env() -> Env {
    let mut vm = Vm::new(&ChainConfig::default()).unwrap();
    let deployer = vm.accounts()[0];
    let token = deploy_token(
        &mut vm,
        deployer,
        deployer,
        &TokenParams {
            name: "GT".into(),
            symbol: "GT".into(),
        },
    );
    Env {
        vm,
        deployer,
        token,
    }
}

impl Env {
    pub fn game(&mut self, router: Address) -> Address {
        let params = DeployParams {
            tier: 1,
            coins_price: COINS_PRICE,
            router,
            accrual_period_secs: 3_600,
            accrual_cap_periods: 24,
        };
        deploy_codeup(&mut self.vm, self.deployer, &params, self.token).unwrap()
    }

    /// Router whose swap callback is `callback`, plus a game bound to it.
    pub fn routed_game(&mut self, callback: Address) -> Address {
        let factory = deploy_factory(&mut self.vm, self.deployer);
        let router = deploy_router(&mut self.vm, self.deployer, callback, factory);
        let game = self.game(router);
        self.vm
            .transact_sol(
                self.deployer,
                factory,
                U256::ZERO,
                &ITestFactory::setCodeupCall { codeup: game },
            )
            .unwrap();
        game
    }

    /// Deposits `value` and takes every tower to the top level.
    pub fn max_out(&mut self, game: Address, value: U256) {
        self.vm
            .transact_sol(self.deployer, game, value, &ICodeup::addGameETHCall {})
            .unwrap();
        for tower in 0..8u64 {
            for _ in 0..5 {
                self.vm
                    .transact_sol(
                        self.deployer,
                        game,
                        U256::ZERO,
                        &ICodeup::upgradeTowerCall {
                            towerId: U256::from(tower),
                        },
                    )
                    .unwrap();
            }
        }
    }
}
