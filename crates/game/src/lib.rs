pub mod abi;
pub mod accrual;
pub mod codeup;
pub mod economy;
pub mod errors;
pub mod guard;
pub mod token;

pub use accrual::{AccrualPolicy, HourlyAccrual};
pub use codeup::{deploy_codeup, Codeup, CodeupStorage, Tower};
pub use errors::{describe, known_errors};
pub use guard::{non_reentrant, GuardState, GuardTicket, Guarded, ReentrancyError, ReentrancyGuard};
pub use token::{deploy_token, CodeupERC20, TokenStorage};
