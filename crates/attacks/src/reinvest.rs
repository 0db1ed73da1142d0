use alloy::primitives::Address;
use alloy::sol_types::{SolCall, SolInterface};
use codeup_chain::{unit, CallResult, Contract, Msg, Revert, Vm};
use codeup_game::abi::ICodeup;
use tracing::debug;

use crate::abi::IReinvestReentrancy;
use crate::state::{common_call, reenter, AttackContext};

/// Router swap callback that re-enters `reinvest`.
pub struct ReinvestReentrancy;

pub fn deploy_reinvest_attacker(vm: &mut Vm, deployer: Address) -> Address {
    vm.deploy(deployer, ReinvestReentrancy, AttackContext::default())
}

impl Contract for ReinvestReentrancy {
    fn name(&self) -> &'static str {
        "ReinvestReentrancy"
    }

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult {
        use IReinvestReentrancy::IReinvestReentrancyCalls as Calls;

        let this = msg.to;
        if msg.is_transfer() {
            return reenter(vm, this, ICodeup::reinvestCall {}.abi_encode().into());
        }
        if let Some(result) = common_call(vm, msg) {
            return result;
        }
        msg.ensure_no_value()?;
        match Calls::abi_decode(&msg.data).map_err(|_| Revert::empty())? {
            Calls::updateCodeUp(call) => {
                vm.storage_mut::<AttackContext>(this)?.arm(call.codeup);
                debug!(attacker = %this, codeup = %call.codeup, "reinvest attacker armed");
                unit()
            }
        }
    }
}
