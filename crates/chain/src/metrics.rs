use alloy::hex;
use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::revert::Revert;

#[derive(Clone)]
pub struct VmMetrics {
    calls_total: IntCounter,
    reverts_total: IntCounterVec,
    transactions_total: IntCounterVec,
}

impl VmMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        let calls_total = IntCounter::with_opts(Opts::new(
            "codeup_vm_calls_total",
            "Total message calls executed, nested calls included",
        ))?;
        let reverts_total = IntCounterVec::new(
            Opts::new(
                "codeup_vm_reverts_total",
                "Total reverted message calls by revert selector",
            ),
            &["selector"],
        )?;
        let transactions_total = IntCounterVec::new(
            Opts::new(
                "codeup_vm_transactions_total",
                "Total top-level transactions by status",
            ),
            &["status"],
        )?;

        registry.register(Box::new(calls_total.clone()))?;
        registry.register(Box::new(reverts_total.clone()))?;
        registry.register(Box::new(transactions_total.clone()))?;

        Ok(Self {
            calls_total,
            reverts_total,
            transactions_total,
        })
    }

    pub fn inc_calls(&self) {
        self.calls_total.inc();
    }

    pub fn observe_revert(&self, revert: &Revert) {
        let selector = revert
            .selector()
            .map(hex::encode_prefixed)
            .unwrap_or_else(|| "none".to_string());
        self.reverts_total.with_label_values(&[selector.as_str()]).inc();
    }

    pub fn observe_transaction(&self, success: bool) {
        let status = if success { "success" } else { "reverted" };
        self.transactions_total.with_label_values(&[status]).inc();
    }
}
