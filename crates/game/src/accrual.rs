use codeup_core::types::DeployParams;

/// Decides how many yield periods a tower earns between two syncs.
pub trait AccrualPolicy {
    /// Whole periods earned moving from `last` to `now`, given that
    /// `accrued` periods were already earned since the last collect.
    fn periods(&self, last: u64, now: u64, accrued: u64) -> u64;
}

/// Yield accrues per wall-clock bucket of `period_secs`, at most
/// `cap_periods` between collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyAccrual {
    pub period_secs: u64,
    pub cap_periods: u64,
}

impl HourlyAccrual {
    pub const fn new(period_secs: u64, cap_periods: u64) -> Self {
        Self {
            period_secs,
            cap_periods,
        }
    }

    pub fn from_params(params: &DeployParams) -> Self {
        Self::new(params.accrual_period_secs, params.accrual_cap_periods)
    }
}

impl Default for HourlyAccrual {
    fn default() -> Self {
        Self::new(3_600, 24)
    }
}

impl AccrualPolicy for HourlyAccrual {
    fn periods(&self, last: u64, now: u64, accrued: u64) -> u64 {
        if self.period_secs == 0 || now <= last {
            return 0;
        }
        let elapsed = now / self.period_secs - last / self.period_secs;
        elapsed.min(self.cap_periods.saturating_sub(accrued))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3_600;

    #[test]
    fn counts_bucket_boundaries_crossed() {
        let accrual = HourlyAccrual::default();
        assert_eq!(accrual.periods(10 * HOUR, 10 * HOUR + 3_599, 0), 0);
        assert_eq!(accrual.periods(10 * HOUR + 3_599, 11 * HOUR, 0), 1);
        assert_eq!(accrual.periods(10 * HOUR + 5, 13 * HOUR + 1, 0), 3);
    }

    #[test]
    fn a_full_period_always_accrues_at_least_one() {
        let accrual = HourlyAccrual::default();
        for last in [1_700_000_000u64, 1_700_000_001, 1_700_003_599] {
            assert!(accrual.periods(last, last + HOUR + 1, 0) >= 1);
        }
    }

    #[test]
    fn caps_periods_between_collects() {
        let accrual = HourlyAccrual::default();
        assert_eq!(accrual.periods(0, 100 * HOUR, 0), 24);
        assert_eq!(accrual.periods(0, 100 * HOUR, 20), 4);
        assert_eq!(accrual.periods(0, 100 * HOUR, 24), 0);
    }

    #[test]
    fn monotonic_in_elapsed_time() {
        let accrual = HourlyAccrual::new(60, 1_000);
        let mut previous = 0;
        for now in (0..10_000).step_by(7) {
            let periods = accrual.periods(0, now, 0);
            assert!(periods >= previous);
            previous = periods;
        }
    }

    #[test]
    fn time_going_backwards_accrues_nothing() {
        assert_eq!(HourlyAccrual::default().periods(5 * HOUR, HOUR, 0), 0);
    }
}
