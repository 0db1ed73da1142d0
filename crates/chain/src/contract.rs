use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::revert::Revert;
use crate::vm::Vm;

pub type CallResult = Result<Bytes, Revert>;

/// The message a contract is invoked with.
#[derive(Debug, Clone)]
pub struct Msg {
    pub sender: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Msg {
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|bytes| bytes.try_into().ok())
    }

    /// Plain value transfer, handled by `receive()`.
    pub fn is_transfer(&self) -> bool {
        self.data.is_empty()
    }

    /// Non-payable functions reject value with empty revert data.
    pub fn ensure_no_value(&self) -> Result<(), Revert> {
        if self.value.is_zero() {
            Ok(())
        } else {
            Err(Revert::empty())
        }
    }
}

/// Contract code. Implementations are stateless: everything that must roll
/// back on revert lives in the contract's storage inside the [`Vm`], so the
/// code can be re-entered while an outer invocation is still on the stack.
pub trait Contract {
    fn name(&self) -> &'static str;

    fn call(&self, vm: &mut Vm, msg: &Msg) -> CallResult;
}

pub fn encode_return<C: SolCall>(ret: &C::Return) -> Bytes {
    C::abi_encode_returns(ret).into()
}

pub fn unit() -> CallResult {
    Ok(Bytes::new())
}
