//! Bivariate cubic-spline interpolation on a rectangular grid in `[0,1]^2`.
//!
//! This is the storage and evaluation backend of the nonparametric
//! transformed-kernel family ([`crate::bicop::kernel`]): a square grid of
//! density values, interpolated with per-axis Catmull-Rom cubics, with
//! uniform margins enforced by construction.

use ndarray::Array2;

/// Cubic polynomial coefficients `a0 + a1 x + a2 x^2 + a3 x^3` on a local
/// `[0, 1]` parameterization of one grid cell.
#[derive(Clone, Copy, Debug)]
struct CubicCoefs {
    a0: f64,
    a1: f64,
    a2: f64,
    a3: f64,
}

impl CubicCoefs {
    fn eval(self, x: f64) -> f64 {
        self.a0 + x * (self.a1 + x * (self.a2 + x * self.a3))
    }

    fn indefinite_integral(self, x: f64) -> f64 {
        x * (self.a0 + x * (self.a1 / 2.0 + x * (self.a2 / 3.0 + x * self.a3 / 4.0)))
    }

    fn integral(self, lo: f64, hi: f64) -> f64 {
        self.indefinite_integral(hi) - self.indefinite_integral(lo)
    }
}

/// Catmull-Rom style tangent-based coefficients through `v1, v2` (the cell
/// endpoints) using `v0, v3` as the neighboring context, on the local grid
/// spacing `grid = [g0, g1, g2, g3]`.
///
/// Mirrors `interpolation_grid.cpp::find_coefs`, including its protection
/// against zero-length grid intervals (collapsing `dt` to the neighboring
/// interval's length rather than dividing by zero).
fn find_coefs(vals: [f64; 4], grid: [f64; 4]) -> CubicCoefs {
    let [v0, v1, v2, v3] = vals;
    let mut dt0 = grid[1] - grid[0];
    let mut dt1 = grid[2] - grid[1];
    let mut dt2 = grid[3] - grid[2];

    if dt1.abs() < 1e-4 {
        dt1 = 1.0;
    }
    if dt0.abs() < 1e-4 {
        dt0 = dt1;
    }
    if dt2.abs() < 1e-4 {
        dt2 = dt1;
    }

    let mut dx1 = (v1 - v0) / dt0 - (v2 - v0) / (dt0 + dt1) + (v2 - v1) / dt1;
    let mut dx2 = (v2 - v1) / dt1 - (v3 - v1) / (dt1 + dt2) + (v3 - v2) / dt2;
    dx1 *= dt1;
    dx2 *= dt1;

    CubicCoefs {
        a0: v1,
        a1: dx1,
        a2: -3.0 * v1 + 3.0 * v2 - 2.0 * dx1 - dx2,
        a3: 2.0 * v1 - 2.0 * v2 + dx1 + dx2,
    }
}

/// Builds the 4-point local window `[grid[max(i-1,0)], grid[i], grid[i+1],
/// grid[min(i+2,m-1)]]` around cell `i`, clamping at the grid boundary.
fn local_window(values: &[f64], i: usize) -> ([f64; 4], usize, usize) {
    let m = values.len();
    let lo = i.saturating_sub(1);
    let hi = (i + 2).min(m - 1);
    (
        [values[lo], values[i], values[i + 1], values[hi]],
        lo,
        hi,
    )
}

fn interp_on_grid(x: f64, vals: [f64; 4], grid: [f64; 4]) -> f64 {
    let span = grid[2] - grid[1];
    let xev = if span.abs() < 1e-14 { 0.0 } else { ((x - grid[1]) / span).max(0.0) };
    find_coefs(vals, grid).eval(xev)
}

/// Integrates the piecewise cubic interpolant of `vals` against `grid` from
/// `0` to `upr`, accumulating cell by cell (mirrors `int_on_grid`).
fn int_on_grid(upr: f64, vals: &[f64], grid: &[f64]) -> f64 {
    let m = grid.len();
    let mut total = 0.0;
    let mut k = 0;
    while k + 1 < m && upr >= grid[k] {
        let lo = k.saturating_sub(1);
        let hi = (k + 2).min(m - 1);
        let window = [vals[lo], vals[k], vals[k + 1], vals[hi]];
        let grid_window = [grid[lo], grid[k], grid[k + 1], grid[hi]];
        let coefs = find_coefs(window, grid_window);
        let cell_width = grid[k + 1] - grid[k];
        let fraction = ((upr - grid[k]) / cell_width).min(1.0);
        total += coefs.integral(0.0, fraction.max(0.0)) * cell_width;
        k += 1;
    }
    total
}

/// A bivariate cubic-spline density interpolant on a square grid, with
/// uniform margins (row- and column-integrals equal to 1).
#[derive(Clone, Debug)]
pub struct InterpolationGrid {
    grid_points: Vec<f64>,
    values: Array2<f64>,
}

impl InterpolationGrid {
    /// Builds a grid from ascending `grid_points` and a square `values`
    /// matrix of matching size.
    ///
    /// # Panics
    /// Panics if `values` is not square or its size does not match
    /// `grid_points.len()`; this is an internal invariant enforced by every
    /// caller inside this crate (the nonparametric family's `fit`), not a
    /// user-facing validation boundary.
    #[must_use]
    pub fn new(grid_points: Vec<f64>, values: Array2<f64>) -> Self {
        let m = grid_points.len();
        assert_eq!(values.nrows(), m, "interpolation grid values must be square and match grid_points");
        assert_eq!(values.ncols(), m, "interpolation grid values must be square and match grid_points");
        Self { grid_points, values }
    }

    /// The grid size `m`.
    #[must_use]
    pub fn m(&self) -> usize {
        self.grid_points.len()
    }

    /// The underlying grid points.
    #[must_use]
    pub fn grid_points(&self) -> &[f64] {
        &self.grid_points
    }

    /// Transposes the grid in place (used when evaluating the "other"
    /// conditional direction without duplicating storage).
    pub fn flip(&mut self) {
        self.values = self.values.t().to_owned();
    }

    fn locate_cell(&self, x: f64) -> usize {
        let m = self.grid_points.len();
        let mut cell = 0;
        for k in 1..(m - 1) {
            if x >= self.grid_points[k] {
                cell = k;
            }
        }
        cell
    }

    /// Evaluates the interpolated density at a single point `(u1, u2)`.
    #[must_use]
    pub fn interpolate(&self, u1: f64, u2: f64) -> f64 {
        let m = self.grid_points.len();
        let i = self.locate_cell(u1);
        let (row_window, lo_i, hi_i) = local_window(&self.grid_points, i);

        let j = self.locate_cell(u2);
        let lo_j = j.saturating_sub(1);
        let hi_j = (j + 2).min(m - 1);

        let mut column_values = [0.0_f64; 4];
        for (slot, jj) in [lo_j, j, j + 1, hi_j].into_iter().enumerate() {
            let row_values = [
                self.values[[lo_i, jj]],
                self.values[[i, jj]],
                self.values[[i + 1, jj]],
                self.values[[hi_i, jj]],
            ];
            column_values[slot] = interp_on_grid(u1, row_values, row_window).max(0.0);
        }

        let col_window = [
            self.grid_points[lo_j],
            self.grid_points[j],
            self.grid_points[j + 1],
            self.grid_points[hi_j],
        ];
        interp_on_grid(u2, column_values, col_window).max(1e-15)
    }

    /// The conditional distribution function along axis `cond_var` (1 or
    /// 2), i.e. the normalized 1-D integral of the interpolant holding the
    /// other coordinate fixed at `u_fixed`, evaluated at `upr`.
    #[must_use]
    pub fn integrate_1d(&self, u_fixed: f64, upr: f64, cond_var: u8) -> f64 {
        let m = self.grid_points.len();
        let mut marginal = vec![0.0_f64; m];
        for (k, &g) in self.grid_points.clone().iter().enumerate() {
            marginal[k] = if cond_var == 1 { self.interpolate(u_fixed, g) } else { self.interpolate(g, u_fixed) };
        }
        let numerator = int_on_grid(upr, &marginal, &self.grid_points);
        let denominator = int_on_grid(1.0, &marginal, &self.grid_points);
        (numerator / denominator).clamp(1e-10, 1.0 - 1e-10)
    }

    /// Inverts [`Self::integrate_1d`] at probability level `q` via
    /// bisection, bounded to 15 iterations to match the original
    /// implementation's `inv_intergrate_1d`.
    #[must_use]
    pub fn inv_integrate_1d(&self, u_fixed: f64, q: f64, cond_var: u8) -> f64 {
        const MAX_ITER: usize = 15;
        let f_at = |x: f64| self.integrate_1d(u_fixed, x, cond_var) - q;

        let f0 = f_at(0.0);
        if f0 >= 0.0 {
            return 0.0;
        }
        let f1 = f_at(1.0);
        if f1 <= 0.0 {
            return 1.0;
        }

        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..MAX_ITER {
            let mid = 0.5 * (lo + hi);
            if f_at(mid) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn uniform_grid(m: usize) -> InterpolationGrid {
        let grid_points: Vec<f64> = (0..m).map(|k| k as f64 / (m - 1) as f64).collect();
        let values = Array2::from_elem((m, m), 1.0);
        InterpolationGrid::new(grid_points, values)
    }

    #[test]
    fn uniform_density_interpolates_close_to_one() {
        let grid = uniform_grid(10);
        let value = grid.interpolate(0.5, 0.5);
        assert_approx_eq!(f64, value, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn integrate_1d_of_uniform_density_is_identity() {
        let grid = uniform_grid(10);
        let value = grid.integrate_1d(0.5, 0.7, 1);
        assert_approx_eq!(f64, value, 0.7, epsilon = 1e-3);
    }

    #[test]
    fn inverse_integrate_1d_round_trips() {
        let grid = uniform_grid(10);
        let q = grid.integrate_1d(0.3, 0.6, 2);
        let x = grid.inv_integrate_1d(0.3, q, 2);
        assert_approx_eq!(f64, x, 0.6, epsilon = 1e-2);
    }

    #[test]
    fn flip_transposes_values() {
        let mut grid = uniform_grid(5);
        let before = grid.interpolate(0.2, 0.8);
        grid.flip();
        let after = grid.interpolate(0.8, 0.2);
        assert_approx_eq!(f64, before, after, epsilon = 1e-6);
    }
}
