use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolInterface;
use codeup_chain::{encode_return, unit, CallResult, Contract, Msg, Revert, Vm};
use codeup_core::types::DeployParams;
use codeup_dex::abi::IUniswapV2Router02;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::abi::{ICodeup, ICodeupERC20};
use crate::accrual::{AccrualPolicy, HourlyAccrual};
use crate::economy::{
    reinvest_buyback, reinvest_credit, upgrade_price, upgrade_reward, upgrade_yield, MAX_LEVEL,
    TOKENS_PER_COIN, TOWER_COUNT,
};
use crate::guard::{non_reentrant, Guarded, ReentrancyGuard};

const MAX_TIER: u64 = 10;

/// Per-player game state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tower {
    pub coins: U256,
    pub money: U256,
    pub money2: U256,
    pub yields: U256,
    pub timestamp: u64,
    pub hrs: u64,
    pub levels: [u8; TOWER_COUNT],
    pub pending_reward: U256,
}

impl Tower {
    fn to_abi(&self) -> ICodeup::Tower {
        ICodeup::Tower {
            coins: self.coins,
            money: self.money,
            money2: self.money2,
            yields: self.yields,
            timestamp: U256::from(self.timestamp),
            hrs: U256::from(self.hrs),
            pendingReward: self.pending_reward,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeupStorage {
    pub guard: ReentrancyGuard,
    pub towers: HashMap<Address, Tower>,
}

impl CodeupStorage {
    pub fn tower(&self, user: Address) -> Tower {
        self.towers.get(&user).cloned().unwrap_or_default()
    }
}

impl Guarded for CodeupStorage {
    fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }

    fn guard_mut(&mut self) -> &mut ReentrancyGuard {
        &mut self.guard
    }
}

/// The tower game. Constructor arguments are immutable and live in the
/// code; player state lives in [`CodeupStorage`].
#[derive(Debug, Clone)]
pub struct Codeup<A = HourlyAccrual> {
    tier: u64,
    coins_price: U256,
    router: Address,
    token: Address,
    accrual: A,
}

impl<A: AccrualPolicy> Codeup<A> {
    pub fn new(
        tier: u64,
        coins_price: U256,
        router: Address,
        token: Address,
        accrual: A,
    ) -> Result<Self, Revert> {
        if tier == 0 || tier > MAX_TIER || coins_price.is_zero() {
            return Err(Revert::with_error(ICodeup::InvalidConfiguration {
                tier: U256::from(tier),
                coinsPrice: coins_price,
            }));
        }
        Ok(Self {
            tier,
            coins_price,
            router,
            token,
            accrual,
        })
    }

    /// Credits the periods elapsed since the player's last sync.
    fn sync(&self, tower: &mut Tower, now: u64) {
        if tower.timestamp == 0 {
            tower.timestamp = now;
            return;
        }
        let periods = self.accrual.periods(tower.timestamp, now, tower.hrs);
        tower.money += tower.yields * U256::from(periods);
        tower.hrs += periods;
        tower.timestamp = now;
    }

    /// Syncs `user` and hands the tower to `update`.
    fn with_tower<T>(
        &self,
        vm: &mut Vm,
        this: Address,
        user: Address,
        update: impl FnOnce(&mut Tower) -> Result<T, Revert>,
    ) -> Result<T, Revert> {
        let now = vm.timestamp();
        let storage = vm.storage_mut::<CodeupStorage>(this)?;
        let tower = storage.towers.entry(user).or_default();
        self.sync(tower, now);
        update(tower)
    }

    fn add_game_eth(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        let coins = msg.value / self.coins_price;
        if coins.is_zero() {
            return Err(Revert::with_error(ICodeup::ZeroValue {}));
        }
        self.with_tower(vm, msg.to, msg.sender, |tower| {
            tower.coins += coins;
            Ok(())
        })?;
        vm.emit(
            msg.to,
            &ICodeup::AddGameETH {
                user: msg.sender,
                value: msg.value,
                coins,
            },
        );
        unit()
    }

    fn upgrade_tower(&self, vm: &mut Vm, msg: &Msg, tower_id: U256) -> CallResult {
        let index = usize::try_from(tower_id)
            .ok()
            .filter(|index| *index < TOWER_COUNT)
            .ok_or_else(|| Revert::with_error(ICodeup::InvalidTower { towerId: tower_id }))?;
        let tier = self.tier;
        let (level, price) = self.with_tower(vm, msg.to, msg.sender, |tower| {
            let current = tower.levels[index];
            if current >= MAX_LEVEL {
                return Err(Revert::with_error(ICodeup::MaxLevelReached { towerId: tower_id }));
            }
            let level = current + 1;
            let price = upgrade_price(index, level, tier)
                .ok_or_else(|| Revert::with_error(ICodeup::InvalidLevel { level: U256::from(level) }))?;
            if tower.coins < price {
                return Err(Revert::with_error(ICodeup::InsufficientCoins {
                    required: price,
                    available: tower.coins,
                }));
            }
            let gained = upgrade_yield(index, level).unwrap_or_default();
            tower.coins -= price;
            tower.levels[index] = level;
            tower.yields += gained;
            tower.pending_reward += upgrade_reward(price);
            Ok((level, price))
        })?;
        vm.emit(
            msg.to,
            &ICodeup::UpgradeTower {
                user: msg.sender,
                towerId: tower_id,
                level: U256::from(level),
                price,
            },
        );
        unit()
    }

    fn collect(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        let money = self.with_tower(vm, msg.to, msg.sender, |tower| {
            if tower.money.is_zero() {
                return Err(Revert::with_error(ICodeup::NothingToCollect {}));
            }
            let money = tower.money;
            tower.money2 += money;
            tower.money = U256::ZERO;
            tower.hrs = 0;
            Ok(money)
        })?;
        vm.emit(
            msg.to,
            &ICodeup::Collect {
                user: msg.sender,
                money,
            },
        );
        unit()
    }

    fn withdraw(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        let this = msg.to;
        let money = self.with_tower(vm, this, msg.sender, |tower| {
            if tower.money2.is_zero() {
                return Err(Revert::with_error(ICodeup::NothingToWithdraw {}));
            }
            let money = tower.money2;
            tower.money2 = U256::ZERO;
            Ok(money)
        })?;
        let value = money * self.coins_price;
        ensure_balance(vm, this, value)?;

        debug!(game = %this, to = %msg.sender, %value, "paying out withdrawal");
        if vm.call(this, msg.sender, value, Bytes::new()).is_err() {
            return Err(Revert::with_error(ICodeup::EthTransferFailed {
                to: msg.sender,
                value,
            }));
        }
        vm.emit(
            this,
            &ICodeup::Withdraw {
                user: msg.sender,
                money,
                value,
            },
        );
        unit()
    }

    fn reinvest(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        let this = msg.to;
        let (money, coins) = self.with_tower(vm, this, msg.sender, |tower| {
            if tower.money2.is_zero() {
                return Err(Revert::with_error(ICodeup::NothingToReinvest {}));
            }
            let money = tower.money2;
            let coins = reinvest_credit(money);
            tower.money2 = U256::ZERO;
            tower.coins += coins;
            Ok((money, coins))
        })?;
        let buyback = reinvest_buyback(money, self.coins_price);
        self.swap_for_tokens(vm, this, buyback, this)?;
        vm.emit(
            this,
            &ICodeup::Reinvest {
                user: msg.sender,
                money,
                coins,
                buyback,
            },
        );
        unit()
    }

    fn claim(&self, vm: &mut Vm, msg: &Msg, recipient: Address) -> CallResult {
        let this = msg.to;
        let reward = self.with_tower(vm, this, msg.sender, |tower| {
            if tower.pending_reward.is_zero() {
                return Err(Revert::with_error(ICodeup::NothingToClaim {}));
            }
            let reward = tower.pending_reward;
            tower.pending_reward = U256::ZERO;
            Ok(reward)
        })?;

        let amount = reward * TOKENS_PER_COIN;
        let treasury = vm.call_sol(
            this,
            self.token,
            U256::ZERO,
            &ICodeupERC20::balanceOfCall { account: this },
        )?;
        let swapped = treasury < amount;
        if swapped {
            let value = reward * self.coins_price;
            self.swap_for_tokens(vm, this, value, recipient)?;
        } else {
            vm.call_sol(
                this,
                self.token,
                U256::ZERO,
                &ICodeupERC20::transferCall {
                    to: recipient,
                    value: amount,
                },
            )?;
        }
        vm.emit(
            this,
            &ICodeup::ClaimCodeupERC20 {
                user: msg.sender,
                recipient,
                amount,
                swapped,
            },
        );
        unit()
    }

    /// Buys the game token with `value` wei through the router.
    fn swap_for_tokens(
        &self,
        vm: &mut Vm,
        this: Address,
        value: U256,
        to: Address,
    ) -> Result<(), Revert> {
        ensure_balance(vm, this, value)?;
        let weth = vm.call_sol(this, self.router, U256::ZERO, &IUniswapV2Router02::WETHCall {})?;
        let swap = IUniswapV2Router02::swapExactETHForTokensCall {
            amountOutMin: U256::ZERO,
            path: vec![weth, self.token],
            to,
            deadline: U256::from(vm.timestamp()),
        };
        debug!(game = %this, router = %self.router, %value, %to, "swapping for game token");
        vm.call_sol(this, self.router, value, &swap)?;
        Ok(())
    }

    fn view(&self, vm: &mut Vm, this: Address, call: ICodeup::ICodeupCalls) -> CallResult {
        use ICodeup::ICodeupCalls as Calls;

        let storage = vm.storage::<CodeupStorage>(this)?;
        match call {
            Calls::towerOf(call) => Ok(encode_return::<ICodeup::towerOfCall>(
                &storage.tower(call.user).to_abi(),
            )),
            Calls::levelsOf(call) => Ok(encode_return::<ICodeup::levelsOfCall>(
                &storage.tower(call.user).levels,
            )),
            Calls::pendingCodeupERC20(call) => Ok(encode_return::<ICodeup::pendingCodeupERC20Call>(
                &storage.tower(call.user).pending_reward,
            )),
            Calls::reentrancyGuardEntered(_) => Ok(encode_return::<
                ICodeup::reentrancyGuardEnteredCall,
            >(&storage.guard.is_entered())),
            Calls::getUpgradePrice(call) => {
                let (tower, level) = tower_and_level(call.towerId, call.level)?;
                let price = upgrade_price(tower, level, self.tier)
                    .ok_or_else(|| Revert::with_error(ICodeup::InvalidLevel { level: call.level }))?;
                Ok(encode_return::<ICodeup::getUpgradePriceCall>(&price))
            }
            Calls::getYield(call) => {
                let (tower, level) = tower_and_level(call.towerId, call.level)?;
                let gained = upgrade_yield(tower, level)
                    .ok_or_else(|| Revert::with_error(ICodeup::InvalidLevel { level: call.level }))?;
                Ok(encode_return::<ICodeup::getYieldCall>(&gained))
            }
            Calls::coinsPrice(_) => Ok(encode_return::<ICodeup::coinsPriceCall>(&self.coins_price)),
            Calls::tier(_) => Ok(encode_return::<ICodeup::tierCall>(&U256::from(self.tier))),
            Calls::router(_) => Ok(encode_return::<ICodeup::routerCall>(&self.router)),
            Calls::token(_) => Ok(encode_return::<ICodeup::tokenCall>(&self.token)),
            _ => Err(Revert::empty()),
        }
    }
}

impl<A: AccrualPolicy + 'static> Contract for Codeup<A> {
    fn name(&self) -> &'static str {
        "Codeup"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        use ICodeup::ICodeupCalls as Calls;

        if msg.is_transfer() {
            return unit();
        }
        let call = Calls::abi_decode(&msg.data).map_err(|_| Revert::empty())?;
        if !matches!(call, Calls::addGameETH(_)) {
            msg.ensure_no_value()?;
        }

        let this = msg.to;
        match call {
            Calls::addGameETH(_) => self.add_game_eth(vm, msg),
            Calls::upgradeTower(call) => self.upgrade_tower(vm, msg, call.towerId),
            Calls::collect(_) => {
                non_reentrant::<CodeupStorage, _, _>(vm, this, |vm| self.collect(vm, msg))
            }
            Calls::withdraw(_) => {
                non_reentrant::<CodeupStorage, _, _>(vm, this, |vm| self.withdraw(vm, msg))
            }
            Calls::reinvest(_) => {
                non_reentrant::<CodeupStorage, _, _>(vm, this, |vm| self.reinvest(vm, msg))
            }
            Calls::claimCodeupERC20(call) => non_reentrant::<CodeupStorage, _, _>(vm, this, |vm| {
                self.claim(vm, msg, call.recipient)
            }),
            view => self.view(vm, this, view),
        }
    }
}

/// Deploys the game with the default hourly accrual.
pub fn deploy_codeup(
    vm: &mut Vm,
    deployer: Address,
    params: &DeployParams,
    token: Address,
) -> Result<Address, Revert> {
    let code = Codeup::new(
        params.tier,
        params.coins_price,
        params.router,
        token,
        HourlyAccrual::from_params(params),
    )?;
    let address = vm.deploy(deployer, code, CodeupStorage::default());
    info!(
        game = %address,
        tier = params.tier,
        coins_price = %params.coins_price,
        router = %params.router,
        %token,
        "game deployed"
    );
    Ok(address)
}

fn ensure_balance(vm: &Vm, this: Address, required: U256) -> Result<(), Revert> {
    let available = vm.balance(this);
    if available < required {
        return Err(Revert::with_error(ICodeup::InsufficientGameBalance {
            required,
            available,
        }));
    }
    Ok(())
}

fn tower_and_level(tower_id: U256, level: U256) -> Result<(usize, u8), Revert> {
    let tower = usize::try_from(tower_id)
        .ok()
        .filter(|tower| *tower < TOWER_COUNT)
        .ok_or_else(|| Revert::with_error(ICodeup::InvalidTower { towerId: tower_id }))?;
    let level = u8::try_from(level)
        .map_err(|_| Revert::with_error(ICodeup::InvalidLevel { level }))?;
    Ok((tower, level))
}
