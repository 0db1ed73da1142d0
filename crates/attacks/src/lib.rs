pub mod abi;
pub mod claim;
pub mod reinvest;
pub mod state;
pub mod withdraw;

pub use claim::{deploy_claim_attacker, ClaimCodeupERC20Reentrancy};
pub use reinvest::{deploy_reinvest_attacker, ReinvestReentrancy};
pub use state::{AttackContext, AttackState};
pub use withdraw::{deploy_withdraw_attacker, WithdrawReentrance};

#[cfg(test)]
mod testing;
