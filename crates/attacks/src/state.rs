use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolInterface;
use codeup_chain::{encode_return, unit, CallResult, Msg, Revert, Vm};
use tracing::{info, warn};

use crate::abi::IReentrancyAttacker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum AttackState {
    #[default]
    Idle = 0,
    Armed = 1,
    Triggered = 2,
    Settled = 3,
}

impl AttackState {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Idle),
            1 => Some(Self::Armed),
            2 => Some(Self::Triggered),
            3 => Some(Self::Settled),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// A callback in this state issues a re-entry.
    pub fn can_trigger(self) -> bool {
        matches!(self, Self::Armed | Self::Settled)
    }
}

/// Storage shared by every attacker contract.
#[derive(Debug, Clone, Default)]
pub struct AttackContext {
    pub target: Address,
    pub state: AttackState,
    pub attempts: u64,
    pub last_error: Bytes,
    pub absorb_failures: bool,
}

impl AttackContext {
    pub fn armed(target: Address) -> Self {
        let mut ctx = Self::default();
        ctx.arm(target);
        ctx
    }

    pub fn arm(&mut self, target: Address) {
        self.target = target;
        self.state = if target.is_zero() {
            AttackState::Idle
        } else {
            AttackState::Armed
        };
    }

    /// Moves to `Triggered` and returns the attempt number, or `None` when
    /// the callback must not re-enter.
    fn trigger(&mut self) -> Option<u64> {
        if !self.state.can_trigger() {
            return None;
        }
        self.state = AttackState::Triggered;
        self.attempts += 1;
        Some(self.attempts)
    }

    fn settle(&mut self, result: &CallResult) {
        self.state = AttackState::Settled;
        self.last_error = match result {
            Ok(_) => Bytes::new(),
            Err(revert) => revert.data().clone(),
        };
    }
}

/// Body of every attacker callback: call back into the target with `data`
/// once. The nested revert is rethrown unless the attacker absorbs failures.
pub fn reenter(vm: &mut Vm, this: Address, data: Bytes) -> CallResult {
    let ctx = vm.storage_mut::<AttackContext>(this)?;
    let Some(attempt) = ctx.trigger() else {
        return unit();
    };
    let target = ctx.target;
    let absorb = ctx.absorb_failures;
    info!(attacker = %vm.name_of(this), target = %vm.name_of(target), attempt, "re-entering target");

    let result = vm.call(this, target, U256::ZERO, data);
    vm.storage_mut::<AttackContext>(this)?.settle(&result);
    vm.emit(
        this,
        &IReentrancyAttacker::ReentryAttempted {
            target,
            attempt: U256::from(attempt),
            succeeded: result.is_ok(),
        },
    );

    match result {
        Ok(_) => {
            warn!(attacker = %vm.name_of(this), attempt, "re-entry was accepted");
            unit()
        }
        Err(revert) if absorb => {
            info!(attacker = %vm.name_of(this), %revert, "re-entry rejected, absorbing");
            unit()
        }
        Err(revert) => Err(revert),
    }
}

/// Handles the attacker views and `setAbsorbFailures`. `None` when the
/// calldata is not one of them.
pub fn common_call(vm: &mut Vm, msg: &Msg) -> Option<CallResult> {
    use IReentrancyAttacker::IReentrancyAttackerCalls as Calls;

    let call = Calls::abi_decode(&msg.data).ok()?;
    Some(dispatch_common(vm, msg, call))
}

fn dispatch_common(
    vm: &mut Vm,
    msg: &Msg,
    call: IReentrancyAttacker::IReentrancyAttackerCalls,
) -> CallResult {
    use IReentrancyAttacker::IReentrancyAttackerCalls as Calls;

    msg.ensure_no_value()?;
    let ctx = vm.storage_mut::<AttackContext>(msg.to)?;
    match call {
        Calls::attackState(_) => Ok(encode_return::<IReentrancyAttacker::attackStateCall>(
            &ctx.state.as_u8(),
        )),
        Calls::reentryAttempts(_) => Ok(encode_return::<
            IReentrancyAttacker::reentryAttemptsCall,
        >(&U256::from(ctx.attempts))),
        Calls::lastReentryError(_) => Ok(encode_return::<
            IReentrancyAttacker::lastReentryErrorCall,
        >(&ctx.last_error)),
        Calls::setAbsorbFailures(call) => {
            ctx.absorb_failures = call.absorb;
            unit()
        }
    }
}

/// Forwards a typed call from the attacker to its target.
pub fn forward<C: alloy::sol_types::SolCall>(
    vm: &mut Vm,
    this: Address,
    value: U256,
    call: &C,
) -> CallResult {
    let target = vm.storage::<AttackContext>(this)?.target;
    if target.is_zero() {
        return Err(Revert::with_reason("attacker has no target"));
    }
    vm.call_sol(this, target, value, call)?;
    unit()
}
