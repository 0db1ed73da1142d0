use alloy::primitives::{Address, U256};
use alloy::sol_types::SolError;
use anyhow::{anyhow, Result};
use codeup_attacks::abi::{
    IClaimCodeupERC20Reentrancy, IReentrancyAttacker, IReinvestReentrancy, IWithdrawReentrance,
};
use codeup_attacks::{deploy_claim_attacker, deploy_reinvest_attacker, deploy_withdraw_attacker};
use codeup_chain::{Receipt, Revert, TxFailure};
use codeup_core::modes::{FailureMode, ScenarioKind};
use codeup_game::abi::{ICodeup, ReentrancyGuardReentrantCall};
use codeup_game::describe;
use tracing::{debug, info, warn};

use crate::fixture::Deployment;
use crate::state::{ScenarioReport, ScenarioState};

/// Towers the withdraw attacker levels up before collecting.
const WITHDRAW_TOWERS: [u64; 2] = [0, 1];

/// Replays one attack against `deployment`. Setup failures end up in the
/// report instead of aborting the run.
pub fn run_scenario(
    deployment: &mut Deployment,
    kind: ScenarioKind,
    mode: FailureMode,
) -> ScenarioReport {
    let mut report = ScenarioReport::new(kind, mode);
    info!(scenario = %kind, ?mode, "scenario starting");
    let result = match kind {
        ScenarioKind::Withdraw => withdraw(deployment, &mut report),
        ScenarioKind::Reinvest => reinvest(deployment, &mut report),
        ScenarioKind::Claim => claim(deployment, &mut report),
    };
    if let Err(err) = result {
        warn!(scenario = %kind, error = %format!("{err:#}"), "scenario setup failed");
        report.fail(format!("{err:#}"));
    }
    report.finish();
    if report.passed() {
        info!(
            scenario = %kind,
            nested_rejections = report.nested_rejections,
            payouts = report.payouts,
            outer_revert = report.outer_revert.as_deref().unwrap_or("none"),
            "scenario passed"
        );
    } else {
        warn!(
            scenario = %kind,
            reasons = report.failure_summary().as_deref().unwrap_or("unknown"),
            "scenario failed"
        );
    }
    report
}

/// Payout received in `receive` re-enters `withdraw`. The nested call is
/// rejected, so the ETH transfer fails and the outer withdraw reverts with
/// `EthTransferFailed`.
fn withdraw(d: &mut Deployment, report: &mut ScenarioReport) -> Result<()> {
    let from = d.deployer;
    let game = d.game;
    let attacker = deploy_withdraw_attacker(&mut d.vm, from, game);
    configure_failure_mode(d, attacker, report.failure_mode)?;
    report.advance(ScenarioState::Deployed);

    d.send(from, attacker, d.funding.withdraw, &IWithdrawReentrance::addTokensCall {})?;
    for tower in WITHDRAW_TOWERS {
        for _ in 0..d.upgrade_rounds {
            d.send(
                from,
                attacker,
                U256::ZERO,
                &IWithdrawReentrance::upgradeCall {
                    towerId: U256::from(tower),
                },
            )?;
        }
    }
    d.vm.increase_time(d.time_advance_secs);
    d.send(from, attacker, U256::ZERO, &IWithdrawReentrance::collectCall {})?;
    let owed = d
        .vm
        .view_sol(game, &ICodeup::towerOfCall { user: attacker })
        .map_err(view_error)?
        .money2
        * d.params.coins_price;
    report.advance(ScenarioState::Funded);

    begin_attack(d, report, game)?;
    let balance_before = d.vm.balance(attacker);
    let result = d
        .vm
        .transact_sol(from, attacker, U256::ZERO, &IWithdrawReentrance::withdrawCall {});
    let attack = Attack {
        game,
        attacker,
        expected_outer: ICodeup::EthTransferFailed::SIGNATURE,
        outer_matches: |revert: &Revert| revert.is::<ICodeup::EthTransferFailed>(),
        payouts: |receipt: &Receipt| receipt.logs_of::<ICodeup::Withdraw>().len(),
    };
    attack.settle(d, report, result)?;

    let received = d.vm.balance(attacker).saturating_sub(balance_before);
    let expected = if report.failure_mode.absorbs() {
        owed
    } else {
        U256::ZERO
    };
    if received != expected {
        report.fail(format!("attacker received {received} wei, expected {expected}"));
    }
    Ok(())
}

/// The router calls back into the attacker during the buyback swap, and the
/// attacker re-enters `reinvest`.
fn reinvest(d: &mut Deployment, report: &mut ScenarioReport) -> Result<()> {
    let from = d.deployer;
    let attacker = deploy_reinvest_attacker(&mut d.vm, from);
    let game = d.routed_game(attacker)?;
    d.send(
        from,
        attacker,
        U256::ZERO,
        &IReinvestReentrancy::updateCodeUpCall { codeup: game },
    )?;
    configure_failure_mode(d, attacker, report.failure_mode)?;
    report.advance(ScenarioState::Deployed);

    d.max_out(game, d.funding.reinvest)?;
    d.vm.increase_time(d.time_advance_secs);
    d.send(from, game, U256::ZERO, &ICodeup::collectCall {})?;
    report.advance(ScenarioState::Funded);

    begin_attack(d, report, game)?;
    let result = d
        .vm
        .transact_sol(from, game, U256::ZERO, &ICodeup::reinvestCall {});
    Attack {
        game,
        attacker,
        expected_outer: ReentrancyGuardReentrantCall::SIGNATURE,
        outer_matches: |revert: &Revert| revert.is::<ReentrancyGuardReentrantCall>(),
        payouts: |receipt: &Receipt| receipt.logs_of::<ICodeup::Reinvest>().len(),
    }
    .settle(d, report, result)
}

/// The claim has no treasury to pay from, so it swaps through a router whose
/// callback re-enters `claimCodeupERC20`.
fn claim(d: &mut Deployment, report: &mut ScenarioReport) -> Result<()> {
    let from = d.deployer;
    let attacker = deploy_claim_attacker(&mut d.vm, from);
    let game = d.routed_game(attacker)?;
    d.send(
        from,
        attacker,
        U256::ZERO,
        &IClaimCodeupERC20Reentrancy::setCodeupCall { codeup: game },
    )?;
    configure_failure_mode(d, attacker, report.failure_mode)?;
    report.advance(ScenarioState::Deployed);

    d.max_out(game, d.funding.claim)?;
    report.advance(ScenarioState::Funded);

    begin_attack(d, report, game)?;
    let result = d.vm.transact_sol(
        from,
        game,
        U256::ZERO,
        &ICodeup::claimCodeupERC20Call { recipient: from },
    );
    Attack {
        game,
        attacker,
        expected_outer: ReentrancyGuardReentrantCall::SIGNATURE,
        outer_matches: |revert: &Revert| revert.is::<ReentrancyGuardReentrantCall>(),
        payouts: |receipt: &Receipt| receipt.logs_of::<ICodeup::ClaimCodeupERC20>().len(),
    }
    .settle(d, report, result)
}

fn configure_failure_mode(d: &mut Deployment, attacker: Address, mode: FailureMode) -> Result<()> {
    if mode.absorbs() {
        d.send(
            d.deployer,
            attacker,
            U256::ZERO,
            &IReentrancyAttacker::setAbsorbFailuresCall { absorb: true },
        )?;
    }
    Ok(())
}

fn begin_attack(d: &mut Deployment, report: &mut ScenarioReport, game: Address) -> Result<()> {
    if d.guard_entered(game)? {
        report.fail("reentrancy guard entered before the attack");
    }
    report.advance(ScenarioState::Attacking);
    Ok(())
}

fn view_error(revert: Revert) -> anyhow::Error {
    anyhow!("view reverted: {}", describe(&revert))
}

/// What the attack transaction is checked against.
struct Attack<M, P> {
    game: Address,
    attacker: Address,
    expected_outer: &'static str,
    outer_matches: M,
    payouts: P,
}

impl<M, P> Attack<M, P>
where
    M: Fn(&Revert) -> bool,
    P: Fn(&Receipt) -> usize,
{
    fn settle(
        self,
        d: &mut Deployment,
        report: &mut ScenarioReport,
        result: Result<Receipt, TxFailure>,
    ) -> Result<()> {
        let trace = match &result {
            Ok(receipt) => &receipt.trace,
            Err(failure) => &failure.trace,
        };
        report.trace = trace.render(|address| d.vm.name_of(address));
        report.nested_rejections = trace
            .reverts_with::<ReentrancyGuardReentrantCall>()
            .into_iter()
            .filter(|frame| frame.target == self.game && frame.caller == self.attacker)
            .count();
        debug!(scenario = %report.kind, frames = trace.len(), depth = trace.max_depth(), "attack traced");
        report.guard_unlocked = !d.guard_entered(self.game)?;

        match (report.failure_mode, result) {
            (FailureMode::Propagate, Err(failure)) => {
                let outer = describe(&failure.revert);
                if !(self.outer_matches)(&failure.revert) {
                    report.fail(format!(
                        "outer call reverted with {outer}, expected {}",
                        self.expected_outer
                    ));
                }
                report.outer_revert = Some(outer);
            }
            (FailureMode::Propagate, Ok(_)) => {
                report.fail("outer call succeeded although the attacker rethrows");
            }
            (FailureMode::Absorb, Ok(receipt)) => {
                report.payouts = (self.payouts)(&receipt);
                if report.payouts != 1 {
                    report.fail(format!("{} payouts, expected exactly one", report.payouts));
                }
            }
            (FailureMode::Absorb, Err(failure)) => {
                let outer = describe(&failure.revert);
                report.fail(format!("outer call reverted with {outer} although the attacker absorbs"));
                report.outer_revert = Some(outer);
            }
        }

        if report.nested_rejections == 0 {
            report.fail("no nested call was rejected by the reentrancy guard");
        }
        if !report.guard_unlocked {
            report.fail("reentrancy guard still entered after the attack");
        }
        Ok(())
    }
}
