use alloy::primitives::{keccak256, Address, Bytes, Log, U256};
use alloy::sol_types::{SolCall, SolEvent};
use codeup_core::config::ChainConfig;
use codeup_core::utils::parse_eth;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::{CallResult, Contract, Msg};
use crate::metrics::VmMetrics;
use crate::revert::Revert;
use crate::state::{ContractStorage, WorldState};
use crate::trace::{CallFrame, CallTrace};

#[derive(Debug, Clone)]
pub struct Tx {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Tx {
    pub fn new<C: SolCall>(from: Address, to: Address, call: &C) -> Self {
        Self {
            from,
            to,
            value: U256::ZERO,
            data: call.abi_encode().into(),
        }
    }

    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        Self {
            from,
            to,
            value,
            data: Bytes::new(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub block: BlockEnv,
    pub output: Bytes,
    pub logs: Vec<Log>,
    pub trace: CallTrace,
}

impl Receipt {
    pub fn decode<C: SolCall>(&self) -> Result<C::Return, alloy::sol_types::Error> {
        C::abi_decode_returns(&self.output)
    }

    pub fn logs_of<E: SolEvent>(&self) -> Vec<E> {
        self.logs
            .iter()
            .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| E::decode_log_data(&log.data).ok())
            .collect()
    }
}

/// A top-level transaction that reverted. All of its state changes were
/// discarded; the trace still shows every frame that ran.
#[derive(Debug, Clone, Error)]
#[error("transaction from {from} to {to} reverted: {revert}")]
pub struct TxFailure {
    pub from: Address,
    pub to: Address,
    pub block: BlockEnv,
    pub revert: Revert,
    pub trace: CallTrace,
}

/// In-process execution environment: accounts, contract code and storage,
/// a block clock, and synchronous message calls with per-call checkpoints.
pub struct Vm {
    state: WorldState,
    code: HashMap<Address, Rc<dyn Contract>>,
    labels: HashMap<Address, String>,
    accounts: Vec<Address>,
    block: BlockEnv,
    block_time_secs: u64,
    pending_time_secs: u64,
    max_call_depth: usize,
    depth: usize,
    frames: Vec<CallFrame>,
    metrics: Option<VmMetrics>,
}

impl Vm {
    pub fn new(cfg: &ChainConfig) -> codeup_core::Result<Self> {
        cfg.validate()?;
        let balance = parse_eth(&cfg.account_balance_eth)?;
        let mut state = WorldState::default();
        let mut labels = HashMap::new();
        let accounts: Vec<Address> = (0..cfg.accounts).map(dev_account).collect();
        for (index, account) in accounts.iter().enumerate() {
            state.set_balance(*account, balance);
            labels.insert(*account, format!("account{index}"));
        }
        Ok(Self {
            state,
            code: HashMap::new(),
            labels,
            accounts,
            block: BlockEnv {
                number: 0,
                timestamp: cfg.genesis_timestamp,
            },
            block_time_secs: cfg.block_time_secs,
            pending_time_secs: 0,
            max_call_depth: cfg.max_call_depth,
            depth: 0,
            frames: Vec::new(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: VmMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn account(&self, index: usize) -> Option<Address> {
        self.accounts.get(index).copied()
    }

    pub fn block(&self) -> BlockEnv {
        self.block
    }

    /// Timestamp of the block currently being executed.
    pub fn timestamp(&self) -> u64 {
        self.block.timestamp
    }

    /// Shifts the clock for the next mined block, like `evm_increaseTime`.
    pub fn increase_time(&mut self, secs: u64) {
        self.pending_time_secs = self.pending_time_secs.saturating_add(secs);
        info!(secs, pending = self.pending_time_secs, "time increased");
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state.balance(address)
    }

    pub fn set_balance(&mut self, address: Address, amount: U256) {
        self.state.set_balance(address, amount);
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state.nonce(address)
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    pub fn label(&mut self, address: Address, name: impl Into<String>) {
        self.labels.insert(address, name.into());
    }

    pub fn name_of(&self, address: Address) -> String {
        self.labels
            .get(&address)
            .cloned()
            .unwrap_or_else(|| address.to_string())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Installs `code` at the CREATE address of `deployer`.
    pub fn deploy<C, S>(&mut self, deployer: Address, code: C, storage: S) -> Address
    where
        C: Contract + 'static,
        S: ContractStorage,
    {
        self.mine_block();
        let nonce = self.state.bump_nonce(deployer);
        let address = deployer.create(nonce);
        let name = code.name();
        self.code.insert(address, Rc::new(code));
        self.state.insert_storage(address, storage);
        self.labels
            .entry(address)
            .or_insert_with(|| name.to_string());
        info!(%address, %deployer, contract = name, block = self.block.number, "contract deployed");
        address
    }

    /// Mines one block and runs `tx` atomically.
    pub fn transact(&mut self, tx: Tx) -> Result<Receipt, TxFailure> {
        self.mine_block();
        self.state.bump_nonce(tx.from);
        self.state.take_logs();
        self.frames.clear();
        debug!(
            from = %tx.from,
            to = %tx.to,
            value = %tx.value,
            block = self.block.number,
            "executing transaction"
        );

        let result = self.call(tx.from, tx.to, tx.value, tx.data);
        let trace = CallTrace::new(std::mem::take(&mut self.frames));
        let logs = self.state.take_logs();
        if let Some(metrics) = &self.metrics {
            metrics.observe_transaction(result.is_ok());
        }

        match result {
            Ok(output) => Ok(Receipt {
                block: self.block,
                output,
                logs,
                trace,
            }),
            Err(revert) => {
                warn!(
                    from = %tx.from,
                    to = %self.name_of(tx.to),
                    block = self.block.number,
                    %revert,
                    "transaction reverted"
                );
                Err(TxFailure {
                    from: tx.from,
                    to: tx.to,
                    block: self.block,
                    revert,
                    trace,
                })
            }
        }
    }

    pub fn transact_sol<C: SolCall>(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        call: &C,
    ) -> Result<Receipt, TxFailure> {
        self.transact(Tx::new(from, to, call).with_value(value))
    }

    /// Executes a call without mining and discards every state change.
    pub fn view_sol<C: SolCall>(&mut self, to: Address, call: &C) -> Result<C::Return, Revert> {
        let checkpoint = self.state.clone();
        let frames = std::mem::take(&mut self.frames);
        let result = self.call_sol(Address::ZERO, to, U256::ZERO, call);
        self.state = checkpoint;
        self.frames = frames;
        result
    }

    /// A nested message call. A failed call rolls back its own state
    /// changes and hands the revert data to the caller.
    pub fn call(&mut self, caller: Address, to: Address, value: U256, data: Bytes) -> CallResult {
        let index = self.frames.len();
        self.frames
            .push(CallFrame::open(self.depth, caller, to, value, &data));
        if let Some(metrics) = &self.metrics {
            metrics.inc_calls();
        }

        let result = if self.depth >= self.max_call_depth {
            Err(Revert::with_reason("max call depth exceeded"))
        } else {
            let checkpoint = self.state.clone();
            self.depth += 1;
            let result = self.execute(caller, to, value, data);
            self.depth -= 1;
            if result.is_err() {
                self.state = checkpoint;
            }
            result
        };

        if let Err(revert) = &result {
            debug!(
                caller = %self.name_of(caller),
                target = %self.name_of(to),
                depth = self.depth,
                %revert,
                "call reverted"
            );
            if let Some(metrics) = &self.metrics {
                metrics.observe_revert(revert);
            }
        }
        self.frames[index].close(&result);
        result
    }

    /// Typed high-level call: reverts when `to` has no code and bubbles the
    /// callee's revert data unchanged.
    pub fn call_sol<C: SolCall>(
        &mut self,
        caller: Address,
        to: Address,
        value: U256,
        call: &C,
    ) -> Result<C::Return, Revert> {
        if !self.has_code(to) {
            return Err(Revert::with_reason(format!(
                "{} called on {to}, which has no code",
                C::SIGNATURE
            )));
        }
        let output = self.call(caller, to, value, call.abi_encode().into())?;
        C::abi_decode_returns(&output).map_err(|err| {
            Revert::with_reason(format!("invalid return data for {}: {err}", C::SIGNATURE))
        })
    }

    pub fn emit<E: SolEvent>(&mut self, address: Address, event: &E) {
        self.state.push_log(Log {
            address,
            data: event.encode_log_data(),
        });
    }

    pub fn storage<T: Any>(&self, address: Address) -> Result<&T, Revert> {
        self.state
            .storage::<T>(address)
            .ok_or_else(|| missing_storage::<T>(address))
    }

    pub fn storage_mut<T: Any>(&mut self, address: Address) -> Result<&mut T, Revert> {
        self.state
            .storage_mut::<T>(address)
            .ok_or_else(|| missing_storage::<T>(address))
    }

    fn execute(&mut self, caller: Address, to: Address, value: U256, data: Bytes) -> CallResult {
        self.state.transfer(caller, to, value)?;
        let Some(code) = self.code.get(&to).cloned() else {
            return Ok(Bytes::new());
        };
        let msg = Msg {
            sender: caller,
            to,
            value,
            data,
        };
        code.call(self, &msg)
    }

    fn mine_block(&mut self) {
        self.block.number += 1;
        self.block.timestamp = self
            .block
            .timestamp
            .saturating_add(self.block_time_secs)
            .saturating_add(self.pending_time_secs);
        self.pending_time_secs = 0;
    }
}

fn missing_storage<T>(address: Address) -> Revert {
    Revert::with_reason(format!(
        "no {} storage at {address}",
        std::any::type_name::<T>()
    ))
}

/// Deterministic, pre-funded externally owned accounts.
pub fn dev_account(index: usize) -> Address {
    let seed = keccak256(format!("codeup dev account {index}"));
    Address::from_slice(&seed[12..])
}
