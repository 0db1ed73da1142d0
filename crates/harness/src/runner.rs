use anyhow::Result;
use codeup_core::config::AppConfig;
use codeup_core::modes::{FailureMode, ScenarioSelection};
use tracing::{info, warn};

use crate::fixture::Deployment;
use crate::metrics::HarnessMetrics;
use crate::scenarios::run_scenario;
use crate::state::ScenarioReport;

pub struct Harness {
    cfg: AppConfig,
    mode: FailureMode,
    metrics: Option<HarnessMetrics>,
}

impl Harness {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let mode = cfg.scenarios.failure_mode()?;
        let metrics = if cfg.observability.metrics_enabled {
            Some(HarnessMetrics::new()?)
        } else {
            None
        };
        Ok(Self { cfg, mode, metrics })
    }

    pub fn metrics(&self) -> Option<&HarnessMetrics> {
        self.metrics.as_ref()
    }

    /// Builds one shared deployment and replays the selected scenarios
    /// against it, in order.
    pub fn run(&self, selection: ScenarioSelection) -> Result<Vec<ScenarioReport>> {
        let vm_metrics = self.metrics.as_ref().map(|metrics| metrics.vm.clone());
        let mut deployment = Deployment::new(&self.cfg, vm_metrics)?;
        if let Some(metrics) = &self.metrics {
            metrics.deployments_total.inc();
        }

        let mut reports = Vec::new();
        for kind in selection.kinds() {
            let report = run_scenario(&mut deployment, kind, self.mode);
            if let Some(metrics) = &self.metrics {
                metrics.observe(&report);
            }
            reports.push(report);
        }

        let passed = reports.iter().filter(|report| report.passed()).count();
        if passed == reports.len() {
            info!(passed, mode = ?self.mode, "all scenarios passed");
        } else {
            warn!(passed, failed = reports.len() - passed, mode = ?self.mode, "scenarios failed");
        }
        Ok(reports)
    }
}

pub fn all_passed(reports: &[ScenarioReport]) -> bool {
    reports.iter().all(ScenarioReport::passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeup_core::modes::ScenarioKind;

    #[test]
    fn default_config_passes_every_scenario() {
        let harness = Harness::new(AppConfig::default()).unwrap();
        let reports = harness.run(ScenarioSelection::All).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(all_passed(&reports));
        assert!(harness.metrics().is_none());
    }

    #[test]
    fn metrics_count_each_run() {
        let raw = r#"
            [observability]
            metrics_enabled = true

            [scenarios]
            failure_mode = "absorb"
        "#;
        let cfg = AppConfig::from_toml_str(raw).unwrap();
        let harness = Harness::new(cfg).unwrap();
        let reports = harness
            .run(ScenarioSelection::Only(ScenarioKind::Claim))
            .unwrap();
        assert!(all_passed(&reports));

        let metrics = harness.metrics().unwrap();
        assert_eq!(metrics.scenario_count(ScenarioKind::Claim, true), 1);
        assert_eq!(metrics.deployments_total.get(), 1);
        let text = metrics.gather();
        assert!(text.contains("codeup_payouts_total{scenario=\"claim\"} 1"));
        assert!(text.contains("codeup_vm_transactions_total"));
    }
}
