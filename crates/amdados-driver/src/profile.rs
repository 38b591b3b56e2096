// crates/amdados-driver/src/profile.rs

//! Non-fatal diagnostic accumulator: per-step Schwarz `rel_diff` and
//! step index, folded into a running mean/max rather than used as a
//! convergence gate.

use amdados_grid::BoundaryRecord;

/// Running mean/max of the Schwarz mismatch ratio, accumulated once per
/// logical tick across every subdomain that reported one. Logged at the
/// end of the run; never consulted mid-run.
#[derive(Clone, Copy, Debug, Default)]
pub struct AverageProfile {
    count: u64,
    sum: f64,
    max: f64,
    max_at_step: usize,
}

impl AverageProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one subdomain's Schwarz diagnostic for logical step `t`
    /// into the running statistics.
    pub fn record(&mut self, t: usize, record: &BoundaryRecord) {
        let rel_diff = record.rel_diff();
        self.count += 1;
        self.sum += rel_diff;
        if rel_diff > self.max {
            self.max = rel_diff;
            self.max_at_step = t;
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }

    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub const fn max_at_step(&self) -> usize {
        self.max_at_step
    }

    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.count
    }

    /// Merge another profile's accumulated statistics into this one,
    /// used to fold per-thread partial profiles after a parallel tick.
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.sum += other.sum;
        if other.max > self.max {
            self.max = other.max;
            self.max_at_step = other.max_at_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_rel_diff(num: f64, den: f64) -> BoundaryRecord {
        let mut r = BoundaryRecord::default();
        r.rel_diff_num[0] = num;
        r.rel_diff_den[0] = den;
        r
    }

    #[test]
    fn mean_and_max_track_recorded_values() {
        let mut profile = AverageProfile::new();
        profile.record(0, &record_with_rel_diff(1.0, 10.0));
        profile.record(1, &record_with_rel_diff(5.0, 10.0));
        assert!((profile.mean() - 0.3).abs() < 1e-12);
        assert!((profile.max() - 0.5).abs() < 1e-12);
        assert_eq!(profile.max_at_step(), 1);
    }

    #[test]
    fn merge_combines_two_profiles() {
        let mut a = AverageProfile::new();
        a.record(0, &record_with_rel_diff(2.0, 10.0));
        let mut b = AverageProfile::new();
        b.record(1, &record_with_rel_diff(9.0, 10.0));
        a.merge(&b);
        assert_eq!(a.samples(), 2);
        assert!((a.max() - 0.9).abs() < 1e-12);
    }
}
