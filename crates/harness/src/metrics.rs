use anyhow::Result;
use codeup_chain::VmMetrics;
use codeup_core::metrics::Metrics;
use codeup_core::modes::ScenarioKind;
use prometheus::{IntCounter, IntCounterVec};

use crate::state::ScenarioReport;

pub struct HarnessMetrics {
    metrics: Metrics,
    pub vm: VmMetrics,
    pub scenarios_total: IntCounterVec,
    pub nested_rejections_total: IntCounterVec,
    pub payouts_total: IntCounterVec,
    pub deployments_total: IntCounter,
}

impl HarnessMetrics {
    pub fn new() -> Result<Self> {
        let metrics = Metrics::new("codeup");
        let vm = VmMetrics::new(metrics.registry())?;
        let scenarios_total = metrics.counter_vec(
            "scenarios_total",
            "Total scenario runs by scenario and outcome",
            &["scenario", "outcome"],
        )?;
        let nested_rejections_total = metrics.counter_vec(
            "nested_rejections_total",
            "Nested calls rejected by the reentrancy guard, by scenario",
            &["scenario"],
        )?;
        let payouts_total = metrics.counter_vec(
            "payouts_total",
            "Value-moving game events that survived a scenario, by scenario",
            &["scenario"],
        )?;
        let deployments_total = metrics.counter(
            "deployments_total",
            "Total shared deployments built for a harness run",
        )?;

        Ok(Self {
            metrics,
            vm,
            scenarios_total,
            nested_rejections_total,
            payouts_total,
            deployments_total,
        })
    }

    pub fn observe(&self, report: &ScenarioReport) {
        let scenario = report.kind.as_str();
        let outcome = if report.passed() { "passed" } else { "failed" };
        self.scenarios_total
            .with_label_values(&[scenario, outcome])
            .inc();
        self.nested_rejections_total
            .with_label_values(&[scenario])
            .inc_by(report.nested_rejections as u64);
        self.payouts_total
            .with_label_values(&[scenario])
            .inc_by(report.payouts as u64);
    }

    pub fn scenario_count(&self, kind: ScenarioKind, passed: bool) -> u64 {
        let outcome = if passed { "passed" } else { "failed" };
        self.scenarios_total
            .with_label_values(&[kind.as_str(), outcome])
            .get()
    }

    pub fn gather(&self) -> String {
        self.metrics.gather()
    }
}
