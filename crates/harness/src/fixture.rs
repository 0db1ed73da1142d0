use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use codeup_chain::{Receipt, TxFailure, Vm, VmMetrics};
use codeup_core::config::AppConfig;
use codeup_core::types::{DeployParams, FundingPlan};
use codeup_dex::abi::ITestFactory;
use codeup_dex::{deploy_factory, deploy_router};
use codeup_game::abi::{ICodeup, ICodeupERC20};
use codeup_game::{deploy_codeup, deploy_token};
use tracing::info;

/// Contracts every scenario shares: the game token, and a game bound to the
/// configured router that holds the deployer's whole token balance.
pub struct Deployment {
    pub vm: Vm,
    pub deployer: Address,
    pub token: Address,
    pub game: Address,
    pub params: DeployParams,
    pub funding: FundingPlan,
    pub upgrade_rounds: u64,
    pub time_advance_secs: u64,
}

impl Deployment {
    pub fn new(cfg: &AppConfig, metrics: Option<VmMetrics>) -> Result<Self> {
        let params = cfg.game.deploy_params()?;
        let funding = cfg.scenarios.funding()?;
        let mut vm = Vm::new(&cfg.chain)?;
        if let Some(metrics) = metrics {
            vm = vm.with_metrics(metrics);
        }
        let deployer = vm
            .account(0)
            .ok_or_else(|| anyhow!("chain has no dev accounts"))?;

        let token = deploy_token(&mut vm, deployer, deployer, &cfg.token.params());
        let game = deploy_codeup(&mut vm, deployer, &params, token)
            .map_err(|revert| anyhow!("game constructor reverted: {revert}"))?;

        let balance = vm
            .view_sol(token, &ICodeupERC20::balanceOfCall { account: deployer })
            .map_err(|revert| anyhow!("balanceOf reverted: {revert}"))?;
        let mut deployment = Self {
            vm,
            deployer,
            token,
            game,
            params,
            funding,
            upgrade_rounds: cfg.scenarios.upgrade_rounds,
            time_advance_secs: cfg.scenarios.time_advance_secs,
        };
        deployment.send(
            deployer,
            token,
            U256::ZERO,
            &ICodeupERC20::transferCall {
                to: game,
                value: balance,
            },
        )?;
        info!(%token, %game, treasury = %balance, "shared deployment ready");
        Ok(deployment)
    }

    /// Deploys a pair factory, a router whose swaps call back into
    /// `callback`, and a fresh game bound to that router.
    pub fn routed_game(&mut self, callback: Address) -> Result<Address> {
        let factory = deploy_factory(&mut self.vm, self.deployer);
        let router = deploy_router(&mut self.vm, self.deployer, callback, factory);
        let params = DeployParams {
            router,
            ..self.params.clone()
        };
        let game = deploy_codeup(&mut self.vm, self.deployer, &params, self.token)
            .map_err(|revert| anyhow!("game constructor reverted: {revert}"))?;
        self.send(
            self.deployer,
            factory,
            U256::ZERO,
            &ITestFactory::setCodeupCall { codeup: game },
        )?;
        info!(%game, %router, %factory, callback = %self.vm.name_of(callback), "routed game ready");
        Ok(game)
    }

    /// Deposits `value` from the deployer and takes every tower up
    /// `upgrade_rounds` levels.
    pub fn max_out(&mut self, game: Address, value: U256) -> Result<()> {
        self.send(self.deployer, game, value, &ICodeup::addGameETHCall {})?;
        for tower in 0..codeup_game::economy::TOWER_COUNT {
            self.upgrade(self.deployer, game, tower)?;
        }
        Ok(())
    }

    pub fn upgrade(&mut self, from: Address, to: Address, tower: usize) -> Result<()> {
        for _ in 0..self.upgrade_rounds {
            self.send(
                from,
                to,
                U256::ZERO,
                &ICodeup::upgradeTowerCall {
                    towerId: U256::from(tower),
                },
            )?;
        }
        Ok(())
    }

    /// Setup transaction that must succeed.
    pub fn send<C: SolCall>(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        call: &C,
    ) -> Result<Receipt> {
        self.vm
            .transact_sol(from, to, value, call)
            .map_err(|failure| describe_failure(&self.vm, failure))
            .with_context(|| format!("{} on {}", C::SIGNATURE, self.vm.name_of(to)))
    }

    pub fn guard_entered(&mut self, game: Address) -> Result<bool> {
        self.vm
            .view_sol(game, &ICodeup::reentrancyGuardEnteredCall {})
            .map_err(|revert| anyhow!("reentrancyGuardEntered reverted: {revert}"))
    }
}

fn describe_failure(vm: &Vm, failure: TxFailure) -> anyhow::Error {
    anyhow!(
        "reverted with {}\n{}",
        codeup_game::describe(&failure.revert),
        failure.trace.render(|address| vm.name_of(address))
    )
}
