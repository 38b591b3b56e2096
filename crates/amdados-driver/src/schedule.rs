// crates/amdados-driver/src/schedule.rs

//! Logical-time schedule: the nested `(t_step, sub)` decomposition of
//! the outer time loop and the snapshot-tick selection rule.

/// Decomposition of one logical time loop over `Nt` outer steps, each
/// with `Nsub_iter` inner Schwarz sub-iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub nt: usize,
    pub nsub_iter: usize,
    pub nwrite: usize,
}

impl Schedule {
    #[must_use]
    pub const fn new(nt: usize, nsub_iter: usize, nwrite: usize) -> Self {
        Self { nt, nsub_iter, nwrite }
    }

    /// Total number of logical ticks, `Nt * Nsub_iter`.
    #[must_use]
    pub const fn total_ticks(&self) -> usize {
        self.nt * self.nsub_iter
    }

    /// Decompose logical tick `t` into `(t_step, sub)`.
    #[must_use]
    pub const fn decompose(&self, t: usize) -> (usize, usize) {
        (t / self.nsub_iter, t % self.nsub_iter)
    }

    /// Whether `(t_step, sub)` is a selected snapshot tick.
    #[must_use]
    pub fn is_snapshot(&self, t_step: usize, sub: usize) -> bool {
        is_snapshot_tick(t_step, self.nt, self.nwrite, sub)
    }
}

/// `⌊(Nwrite−1)·(t_step−1)/(Nt−1)⌋ ≠ ⌊(Nwrite−1)·t_step/(Nt−1)⌋` with
/// `sub == 0`. Floor division uses Euclidean rounding so the boundary
/// case `t_step == 0` (where the formal `t_step − 1` term is `−1`)
/// naturally triggers the first snapshot rather than underflowing.
#[must_use]
pub fn is_snapshot_tick(t_step: usize, nt: usize, nwrite: usize, sub: usize) -> bool {
    if sub != 0 {
        return false;
    }
    if nt <= 1 {
        return true;
    }

    let floor_at = |ts: isize| -> isize {
        ((nwrite as isize - 1) * ts).div_euclid(nt as isize - 1)
    };

    floor_at(t_step as isize) != floor_at(t_step as isize - 1)
}
