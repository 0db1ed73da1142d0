use alloy::primitives::{Address, Log, U256};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::revert::Revert;

/// Storage of one deployed contract. Any `Clone + Debug` type qualifies;
/// cloning is how call checkpoints are taken.
pub trait ContractStorage: Any + fmt::Debug {
    fn checkpoint(&self) -> Box<dyn ContractStorage>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ContractStorage for T
where
    T: Any + Clone + fmt::Debug,
{
    fn checkpoint(&self) -> Box<dyn ContractStorage> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Everything a reverted call has to roll back.
#[derive(Debug, Default)]
pub struct WorldState {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    storage: HashMap<Address, Box<dyn ContractStorage>>,
    logs: Vec<Log>,
}

impl Clone for WorldState {
    fn clone(&self) -> Self {
        Self {
            balances: self.balances.clone(),
            nonces: self.nonces.clone(),
            storage: self
                .storage
                .iter()
                .map(|(address, storage)| (*address, (**storage).checkpoint()))
                .collect(),
            logs: self.logs.clone(),
        }
    }
}

impl WorldState {
    pub fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    pub fn set_balance(&mut self, address: Address, amount: U256) {
        self.balances.insert(address, amount);
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), Revert> {
        if value.is_zero() {
            return Ok(());
        }
        let available = self.balance(from);
        let remaining = available
            .checked_sub(value)
            .ok_or_else(|| Revert::with_reason("insufficient balance for transfer"))?;
        self.balances.insert(from, remaining);
        let credited = self.balance(to).saturating_add(value);
        self.balances.insert(to, credited);
        Ok(())
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.nonces.get(&address).copied().unwrap_or_default()
    }

    /// Returns the nonce before the increment.
    pub fn bump_nonce(&mut self, address: Address) -> u64 {
        let nonce = self.nonces.entry(address).or_default();
        let current = *nonce;
        *nonce += 1;
        current
    }

    pub fn insert_storage<S: ContractStorage>(&mut self, address: Address, storage: S) {
        self.storage.insert(address, Box::new(storage));
    }

    pub fn storage<T: Any>(&self, address: Address) -> Option<&T> {
        self.storage
            .get(&address)
            .and_then(|storage| (**storage).as_any().downcast_ref::<T>())
    }

    pub fn storage_mut<T: Any>(&mut self, address: Address) -> Option<&mut T> {
        self.storage
            .get_mut(&address)
            .and_then(|storage| (**storage).as_any_mut().downcast_mut::<T>())
    }

    pub fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.logs)
    }
}
