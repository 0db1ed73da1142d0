use codeup_core::modes::{FailureMode, ScenarioKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Pending,
    Deployed,
    Funded,
    Attacking,
    Passed,
    Failed,
}

impl ScenarioState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

/// Outcome of one replayed attack.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub kind: ScenarioKind,
    pub failure_mode: FailureMode,
    pub state: ScenarioState,
    /// Decoded revert of the outer transaction, `None` when it succeeded.
    pub outer_revert: Option<String>,
    /// Nested calls rejected with `ReentrancyGuardReentrantCall()`.
    pub nested_rejections: usize,
    pub guard_unlocked: bool,
    pub payouts: usize,
    /// Every failed check, in the order it was found.
    pub failure_reasons: Vec<String>,
    #[serde(skip)]
    pub trace: String,
    transitions: Vec<ScenarioState>,
}

impl ScenarioReport {
    pub fn new(kind: ScenarioKind, failure_mode: FailureMode) -> Self {
        Self {
            kind,
            failure_mode,
            state: ScenarioState::Pending,
            outer_revert: None,
            nested_rejections: 0,
            guard_unlocked: false,
            payouts: 0,
            failure_reasons: Vec::new(),
            trace: String::new(),
            transitions: vec![ScenarioState::Pending],
        }
    }

    pub fn advance(&mut self, state: ScenarioState) {
        if self.state.is_terminal() {
            return;
        }
        self.state = state;
        self.transitions.push(state);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failure_reasons.push(reason.into());
        if self.state != ScenarioState::Failed {
            self.state = ScenarioState::Failed;
            self.transitions.push(ScenarioState::Failed);
        }
    }

    /// All failure reasons joined with `"; "`, `None` while nothing failed.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failure_reasons.is_empty() {
            None
        } else {
            Some(self.failure_reasons.join("; "))
        }
    }

    /// Passes unless an earlier check already failed the scenario.
    pub fn finish(&mut self) {
        self.advance(ScenarioState::Passed);
    }

    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }

    pub fn transitions(&self) -> &[ScenarioState] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tracks_transitions() {
        let mut report = ScenarioReport::new(ScenarioKind::Withdraw, FailureMode::Propagate);
        report.advance(ScenarioState::Deployed);
        report.advance(ScenarioState::Funded);
        report.advance(ScenarioState::Attacking);
        report.finish();
        assert!(report.passed());
        assert_eq!(
            report.transitions(),
            &[
                ScenarioState::Pending,
                ScenarioState::Deployed,
                ScenarioState::Funded,
                ScenarioState::Attacking,
                ScenarioState::Passed,
            ]
        );
    }

    #[test]
    fn every_failed_check_is_kept() {
        let mut report = ScenarioReport::new(ScenarioKind::Claim, FailureMode::Absorb);
        report.advance(ScenarioState::Attacking);
        report.fail("outer call succeeded");
        report.fail("reentrancy guard still entered after the attack");
        report.finish();
        assert_eq!(report.state, ScenarioState::Failed);
        assert_eq!(
            report.failure_reasons,
            vec![
                "outer call succeeded".to_string(),
                "reentrancy guard still entered after the attack".to_string(),
            ]
        );
        assert_eq!(
            report.failure_summary().as_deref(),
            Some("outer call succeeded; reentrancy guard still entered after the attack")
        );
        assert_eq!(
            report.transitions(),
            &[
                ScenarioState::Pending,
                ScenarioState::Attacking,
                ScenarioState::Failed,
            ]
        );
    }

    #[test]
    fn failing_after_finish_overrides_a_pass() {
        let mut report = ScenarioReport::new(ScenarioKind::Withdraw, FailureMode::Propagate);
        report.finish();
        report.fail("late check");
        assert!(!report.passed());
        assert_eq!(report.failure_summary().as_deref(), Some("late check"));
    }
}
