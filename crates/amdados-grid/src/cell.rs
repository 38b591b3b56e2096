// crates/amdados-grid/src/cell.rs

//! Resolution-aware subdomain cell: a stackable two-layer value grid
//! (fine, coarse) with uniform refine/coarsen operators and
//! boundary-strip accessors keyed by side.

use amdados_core::error::AmdadosError;
use serde::{Deserialize, Serialize};

/// Which of the two stacked layers is currently authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Fine,
    Coarse,
}

/// One of the four border strips of a rectangular layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Up,
    Down,
    Left,
    Right,
}

impl Side {
    /// All four sides, in a fixed iteration order used throughout the
    /// border-exchange code.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Up, Self::Down, Self::Left, Self::Right]
    }

    /// Stable `0..4` slot used to index per-side diagnostic arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    /// The side a neighbor across `self` would use to refer back to us.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Outward unit normal in `(nx, ny)` grid-index convention, `x`
    /// increasing downward and `y` increasing rightward to match the
    /// row-major `(x, y)` indexing used elsewhere.
    #[must_use]
    pub const fn outward_normal(self) -> (f64, f64) {
        match self {
            Self::Up => (-1.0, 0.0),
            Self::Down => (1.0, 0.0),
            Self::Left => (0.0, -1.0),
            Self::Right => (0.0, 1.0),
        }
    }
}

/// A single-resolution row-major value layer of shape `(rows, cols)`.
#[derive(Clone, Debug, PartialEq)]
struct Layer {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Layer {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> f64 {
        self.values[x * self.cols + y]
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, v: f64) {
        self.values[x * self.cols + y] = v;
    }

    fn boundary(&self, side: Side) -> Vec<f64> {
        match side {
            Side::Up => (0..self.cols).map(|y| self.get(0, y)).collect(),
            Side::Down => (0..self.cols).map(|y| self.get(self.rows - 1, y)).collect(),
            Side::Left => (0..self.rows).map(|x| self.get(x, 0)).collect(),
            Side::Right => (0..self.rows).map(|x| self.get(x, self.cols - 1)).collect(),
        }
    }

    fn set_boundary(&mut self, side: Side, values: &[f64]) -> Result<(), AmdadosError> {
        let expected_len = match side {
            Side::Up | Side::Down => self.cols,
            Side::Left | Side::Right => self.rows,
        };
        if values.len() != expected_len {
            return Err(AmdadosError::InvalidInput(format!(
                "boundary strip length {} does not match expected {expected_len}",
                values.len()
            )));
        }
        match side {
            Side::Up => {
                for (y, &v) in values.iter().enumerate() {
                    self.set(0, y, v);
                }
            }
            Side::Down => {
                let x = self.rows - 1;
                for (y, &v) in values.iter().enumerate() {
                    self.set(x, y, v);
                }
            }
            Side::Left => {
                for (x, &v) in values.iter().enumerate() {
                    self.set(x, 0, v);
                }
            }
            Side::Right => {
                let y = self.cols - 1;
                for (x, &v) in values.iter().enumerate() {
                    self.set(x, y, v);
                }
            }
        }
        Ok(())
    }

    /// Second-from-border row/column of the same layer, used for
    /// Neumann-style mirroring on outflow/parallel-flow sides.
    fn interior_mirror(&self, side: Side) -> Vec<f64> {
        match side {
            Side::Up => (0..self.cols).map(|y| self.get(1, y)).collect(),
            Side::Down => (0..self.cols).map(|y| self.get(self.rows - 2, y)).collect(),
            Side::Left => (0..self.rows).map(|x| self.get(x, 1)).collect(),
            Side::Right => (0..self.rows).map(|x| self.get(x, self.cols - 2)).collect(),
        }
    }
}

/// Two-layer cell: `Fine` is `(Sx, Sy)`, `Coarse` is `(Sx/2, Sy/2)`.
#[derive(Clone, Debug)]
pub struct SubdomainCell {
    active: Resolution,
    fine: Layer,
    coarse: Layer,
}

impl SubdomainCell {
    /// Allocate a zeroed cell. `sx`/`sy` must be even so the coarse
    /// layer divides evenly; this matches the compile-time `Sx, Sy >= 3`
    /// contract in practice since production subdomain sizes are chosen
    /// as powers of two.
    #[must_use]
    pub fn new(sx: usize, sy: usize, active: Resolution) -> Self {
        Self {
            active,
            fine: Layer::zeros(sx, sy),
            coarse: Layer::zeros(sx / 2, sy / 2),
        }
    }

    #[must_use]
    pub const fn active_layer(&self) -> Resolution {
        self.active
    }

    pub fn set_active_layer(&mut self, layer: Resolution) {
        self.active = layer;
    }

    fn layer(&self) -> &Layer {
        match self.active {
            Resolution::Fine => &self.fine,
            Resolution::Coarse => &self.coarse,
        }
    }

    fn layer_mut(&mut self) -> &mut Layer {
        match self.active {
            Resolution::Fine => &mut self.fine,
            Resolution::Coarse => &mut self.coarse,
        }
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.layer().get(x, y)
    }

    pub fn set(&mut self, x: usize, y: usize, v: f64) {
        self.layer_mut().set(x, y, v);
    }

    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        match self.active {
            Resolution::Fine => (self.fine.rows, self.fine.cols),
            Resolution::Coarse => (self.coarse.rows, self.coarse.cols),
        }
    }

    /// Iterate `(x, y, value)` triples of the active layer in row-major
    /// order.
    pub fn for_all_active_nodes(&self, mut f: impl FnMut(usize, usize, f64)) {
        let layer = self.layer();
        for x in 0..layer.rows {
            for y in 0..layer.cols {
                f(x, y, layer.get(x, y));
            }
        }
    }

    /// Iterate `(x, y, value)` triples of the fine layer regardless of
    /// which layer is active, kept fresh by the refresh-after-write
    /// rule so the snapshot observer always reads at full resolution.
    pub fn for_all_fine_nodes(&self, mut f: impl FnMut(usize, usize, f64)) {
        for x in 0..self.fine.rows {
            for y in 0..self.fine.cols {
                f(x, y, self.fine.get(x, y));
            }
        }
    }

    /// Write `(x, y)` of the fine layer directly, regardless of which
    /// layer is active. Used to keep the fine layer the single source
    /// of truth for the working field, so border exchange always sees
    /// full-resolution neighbor data even when a subdomain's active
    /// layer is `Coarse`.
    pub fn set_fine(&mut self, x: usize, y: usize, v: f64) {
        self.fine.set(x, y, v);
    }

    /// Active-layer border strip: length `Sx` at `Up`/`Down`, `Sy` at
    /// `Left`/`Right`.
    #[must_use]
    pub fn boundary(&self, side: Side) -> Vec<f64> {
        self.layer().boundary(side)
    }

    /// Fine-layer border strip, regardless of which layer is active:
    /// length `Sx` at `Up`/`Down`, `Sy` at `Left`/`Right`. This is what
    /// a neighbor's Schwarz update consumes, so a sensor-less
    /// (`Coarse`-active) subdomain still hands out full-resolution
    /// border data.
    #[must_use]
    pub fn fine_boundary(&self, side: Side) -> Vec<f64> {
        self.fine.boundary(side)
    }

    pub fn set_boundary(&mut self, side: Side, values: &[f64]) -> Result<(), AmdadosError> {
        self.layer_mut().set_boundary(side, values)
    }

    #[must_use]
    pub fn interior_mirror(&self, side: Side) -> Vec<f64> {
        self.layer().interior_mirror(side)
    }

    /// Populate the coarse layer from the fine one by block-averaging
    /// 2x2 fine cells, applying `f` to each averaged value.
    pub fn coarsen(&mut self, f: impl Fn(f64) -> f64) {
        let (crows, ccols) = (self.coarse.rows, self.coarse.cols);
        for cx in 0..crows {
            for cy in 0..ccols {
                let (fx, fy) = (cx * 2, cy * 2);
                let avg = 0.25
                    * (self.fine.get(fx, fy)
                        + self.fine.get(fx + 1, fy)
                        + self.fine.get(fx, fy + 1)
                        + self.fine.get(fx + 1, fy + 1));
                self.coarse.set(cx, cy, f(avg));
            }
        }
    }

    /// Populate the fine layer from the coarse one by duplicating each
    /// coarse value into its 2x2 fine block, applying `f` to each
    /// duplicated value.
    pub fn refine(&mut self, f: impl Fn(f64) -> f64) {
        let (crows, ccols) = (self.coarse.rows, self.coarse.cols);
        for cx in 0..crows {
            for cy in 0..ccols {
                let v = f(self.coarse.get(cx, cy));
                let (fx, fy) = (cx * 2, cy * 2);
                self.fine.set(fx, fy, v);
                self.fine.set(fx + 1, fy, v);
                self.fine.set(fx, fy + 1, v);
                self.fine.set(fx + 1, fy + 1, v);
            }
        }
    }

    /// Clamp every node of the active layer to be element-wise `>= 0`.
    pub fn clamp_non_negative(&mut self) {
        let layer = self.layer_mut();
        for v in &mut layer.values {
            if *v < 0.0 {
                *v = 0.0;
            }
        }
    }

    /// Pin the given side's boundary to zero (outer Dirichlet clamp).
    pub fn clamp_outer_side(&mut self, side: Side) {
        let layer = self.layer_mut();
        let len = match side {
            Side::Up | Side::Down => layer.cols,
            Side::Left | Side::Right => layer.rows,
        };
        let zeros = vec![0.0; len];
        layer
            .set_boundary(side, &zeros)
            .expect("zero strip length always matches the layer's own boundary length");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_then_coarsen_on_uniform_field_has_zero_change() {
        let mut cell = SubdomainCell::new(4, 4, Resolution::Coarse);
        for x in 0..2 {
            for y in 0..2 {
                cell.set(x, y, 7.0);
            }
        }
        cell.refine(|v| v);
        cell.set_active_layer(Resolution::Fine);
        let before: Vec<f64> = {
            let mut out = Vec::new();
            cell.for_all_active_nodes(|_, _, v| out.push(v));
            out
        };
        cell.coarsen(|v| v);
        cell.refine(|v| v);
        let after: Vec<f64> = {
            let mut out = Vec::new();
            cell.for_all_active_nodes(|_, _, v| out.push(v));
            out
        };
        for (b, a) in before.iter().zip(after.iter()) {
            assert!((b - a).abs() == 0.0);
        }
    }

    #[test]
    fn boundary_round_trips_through_set_boundary() {
        let mut cell = SubdomainCell::new(4, 4, Resolution::Fine);
        let values = vec![1.0, 2.0, 3.0, 4.0];
        cell.set_boundary(Side::Up, &values).unwrap();
        assert_eq!(cell.boundary(Side::Up), values);
    }

    #[test]
    fn clamp_outer_side_zeroes_the_strip() {
        let mut cell = SubdomainCell::new(4, 4, Resolution::Fine);
        cell.set_boundary(Side::Left, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        cell.clamp_outer_side(Side::Left);
        assert_eq!(cell.boundary(Side::Left), vec![0.0; 4]);
    }

    #[test]
    fn clamp_non_negative_zeroes_negatives_only() {
        let mut cell = SubdomainCell::new(2, 2, Resolution::Fine);
        cell.set(0, 0, -1.0);
        cell.set(0, 1, 2.0);
        cell.clamp_non_negative();
        assert_eq!(cell.get(0, 0), 0.0);
        assert_eq!(cell.get(0, 1), 2.0);
    }

    #[test]
    fn side_opposite_is_involutive() {
        for side in Side::all() {
            assert_eq!(side.opposite().opposite(), side);
        }
    }
}
