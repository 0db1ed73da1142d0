pub mod contract;
pub mod metrics;
pub mod revert;
pub mod state;
pub mod trace;
pub mod vm;

pub use contract::{encode_return, unit, CallResult, Contract, Msg};
pub use metrics::VmMetrics;
pub use revert::Revert;
pub use state::{ContractStorage, WorldState};
pub use trace::{CallFrame, CallTrace, FrameOutcome};
pub use vm::{dev_account, BlockEnv, Receipt, Tx, TxFailure, Vm};
