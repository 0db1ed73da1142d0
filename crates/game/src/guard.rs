use alloy::primitives::Address;
use codeup_chain::{ContractStorage, Revert, Vm};
use thiserror::Error;
use tracing::warn;

use crate::abi::ReentrancyGuardReentrantCall;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reentrant call while the guard is locked")]
pub struct ReentrancyError;

impl From<ReentrancyError> for Revert {
    fn from(_: ReentrancyError) -> Self {
        Revert::with_error(ReentrancyGuardReentrantCall {})
    }
}

/// Proof of a successful `enter`. Handing it back to `exit` is the only way
/// to unlock the guard.
#[must_use = "the guard stays locked until the ticket is passed to exit"]
#[derive(Debug)]
pub struct GuardTicket {
    _private: (),
}

/// Single-latch reentrancy guard, one per contract instance.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    state: GuardState,
    acquisitions: u64,
}

impl ReentrancyGuard {
    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn is_entered(&self) -> bool {
        self.state == GuardState::Locked
    }

    /// Number of guarded calls that entered and exited.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    pub fn enter(&mut self) -> Result<GuardTicket, ReentrancyError> {
        if self.state == GuardState::Locked {
            return Err(ReentrancyError);
        }
        self.state = GuardState::Locked;
        Ok(GuardTicket { _private: () })
    }

    pub fn exit(&mut self, ticket: GuardTicket) {
        let GuardTicket { .. } = ticket;
        self.state = GuardState::Unlocked;
        self.acquisitions += 1;
    }
}

/// Contract storage that embeds a [`ReentrancyGuard`].
pub trait Guarded: ContractStorage {
    fn guard(&self) -> &ReentrancyGuard;

    fn guard_mut(&mut self) -> &mut ReentrancyGuard;
}

/// Runs `body` with the guard of the contract at `this` held, releasing it
/// whether the body returns or reverts.
pub fn non_reentrant<S, T, F>(vm: &mut Vm, this: Address, body: F) -> Result<T, Revert>
where
    S: Guarded,
    F: FnOnce(&mut Vm) -> Result<T, Revert>,
{
    let entered = vm.storage_mut::<S>(this)?.guard_mut().enter();
    let ticket = match entered {
        Ok(ticket) => ticket,
        Err(err) => {
            warn!(contract = %vm.name_of(this), depth = vm.depth(), "reentrant call rejected");
            return Err(err.into());
        }
    };
    let result = body(vm);
    vm.storage_mut::<S>(this)?.guard_mut().exit(ticket);
    result
}
