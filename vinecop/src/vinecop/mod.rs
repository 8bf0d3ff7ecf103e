//! [`Vinecop`]: the `d`-dimensional R-vine cascade built from a
//! [`RVineMatrix`] and one [`Bicop`] per edge.
//!
//! The evaluator (`pdf`, `simulate`, `inverse_rosenblatt`) walks the matrix
//! in "natural order" (see [`RVineMatrix::in_natural_order`]) exactly the
//! way `class.cpp`'s `Vinecop` does: a running `hfunc1`/`hfunc2` table,
//! one column per variable, updated tree by tree.

pub mod controls;
pub mod select;

use ndarray::{Array1, Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;

pub use controls::FitControlsVinecop;

use crate::bicop::Bicop;
use crate::error::{Error, Result};
use crate::family::BicopFamily;
use crate::rvine_matrix::RVineMatrix;
use crate::stats::halton_sequence;

/// A `d`-dimensional regular vine copula: a structure matrix plus a
/// `pair_copulas[tree][edge]` staircase, `tree` in `0..d-1`, `edge` in
/// `0..d-1-tree`.
#[derive(Clone, Debug)]
pub struct Vinecop {
    d: usize,
    vine_matrix: RVineMatrix,
    pair_copulas: Vec<Vec<Bicop>>,
}

/// Checks user interrupt hook, polled at tree boundaries and every 100
/// edges/rows by the long-running evaluator and selection loops.
pub type InterruptHook<'a> = Option<&'a dyn Fn() -> bool>;

fn check_interrupt(hook: InterruptHook<'_>) -> Result<()> {
    if hook.is_some_and(|f| f()) {
        return Err(Error::Cancelled);
    }
    Ok(())
}

impl Vinecop {
    /// Builds an independence vine on `d` variables (a D-vine in the
    /// trivial order `1, 2, ..., d`, every edge independence).
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `d < 2`.
    pub fn new(d: usize) -> Result<Self> {
        if d < 2 {
            return Err(Error::Domain(format!("vine dimension must be at least 2, got {d}")));
        }
        let order: Vec<u32> = (1..=d as u32).collect();
        let vine_matrix = RVineMatrix::construct_d_vine_matrix(&order)?;
        Self::from_matrix(vine_matrix)
    }

    /// Builds an independence vine on a given structure.
    pub fn from_matrix(vine_matrix: RVineMatrix) -> Result<Self> {
        let d = vine_matrix.dim();
        let pair_copulas = Self::make_pair_copula_store(d, |_, _| Bicop::new(BicopFamily::Indep));
        Ok(Self { d, vine_matrix, pair_copulas })
    }

    /// Builds a vine from an explicit structure and pair-copula staircase.
    ///
    /// # Errors
    /// Returns [`Error::Structure`] if `pair_copulas` does not have exactly
    /// `d - 1` tree rows with `d - 1 - tree` edges each.
    pub fn from_structure(vine_matrix: RVineMatrix, pair_copulas: Vec<Vec<Bicop>>) -> Result<Self> {
        let d = vine_matrix.dim();
        if pair_copulas.len() != d - 1 {
            return Err(Error::Structure(format!(
                "expected {} tree levels of pair copulas, got {}",
                d - 1,
                pair_copulas.len()
            )));
        }
        for (tree, row) in pair_copulas.iter().enumerate() {
            if row.len() != d - 1 - tree {
                return Err(Error::Structure(format!(
                    "tree {tree} expected {} pair copulas, got {}",
                    d - 1 - tree,
                    row.len()
                )));
            }
        }
        Ok(Self { d, vine_matrix, pair_copulas })
    }

    /// Selects both structure and pair-copulas from `data` via Dißmann's
    /// algorithm.
    ///
    /// When `controls.select_truncation_level()` is set, the full,
    /// untruncated tree sequence is fit first and then truncated to the
    /// depth that minimizes [`Self::mbicv`] (trying every depth from 0 to
    /// `d - 1` trees and keeping the best), rather than the fixed depth in
    /// `controls.truncation_level()`.
    ///
    /// # Errors
    /// Propagates any [`Error`] from [`select::select_all`].
    pub fn select_all(data: ArrayView2<f64>, controls: &FitControlsVinecop) -> Result<Self> {
        let d = data.ncols();
        if controls.select_truncation_level() {
            let (vine_matrix, pair_copulas) = select::select_all(data, &controls.untruncated())?;
            return Self::best_truncation(d, vine_matrix, pair_copulas, data, controls);
        }
        let (vine_matrix, pair_copulas) = select::select_all(data, controls)?;
        Ok(Self { d, vine_matrix, pair_copulas })
    }

    /// Picks, among truncating `pair_copulas` after `0..=pair_copulas.len()`
    /// trees (deeper trees replaced by independence), the depth minimizing
    /// [`Self::mbicv`] on `data`.
    fn best_truncation(
        d: usize,
        vine_matrix: RVineMatrix,
        pair_copulas: Vec<Vec<Bicop>>,
        data: ArrayView2<f64>,
        controls: &FitControlsVinecop,
    ) -> Result<Self> {
        let max_trees = pair_copulas.len();
        let mut best: Option<(Self, f64)> = None;
        for depth in 0..=max_trees {
            let truncated: Vec<Vec<Bicop>> = pair_copulas
                .iter()
                .enumerate()
                .map(|(tree, row)| {
                    if tree < depth {
                        row.clone()
                    } else {
                        row.iter().map(|_| Bicop::new(BicopFamily::Indep)).collect()
                    }
                })
                .collect();
            let candidate = Self { d, vine_matrix: vine_matrix.clone(), pair_copulas: truncated };
            let score = candidate.mbicv(data, controls.psi0(), controls.num_threads())?;
            if best.as_ref().is_none_or(|(_, best_score)| score < *best_score) {
                best = Some((candidate, score));
            }
        }
        Ok(best.expect("0..=max_trees always yields at least one candidate").0)
    }

    /// Selects only the pair-copulas for a fixed structure.
    ///
    /// # Errors
    /// Propagates any [`Error`] from [`select::select_families`].
    pub fn select_families(data: ArrayView2<f64>, vine_matrix: RVineMatrix, controls: &FitControlsVinecop) -> Result<Self> {
        let d = vine_matrix.dim();
        let pair_copulas = select::select_families(data, &vine_matrix, controls)?;
        Ok(Self { d, vine_matrix, pair_copulas })
    }

    fn make_pair_copula_store(d: usize, mut f: impl FnMut(usize, usize) -> Bicop) -> Vec<Vec<Bicop>> {
        (0..d - 1).map(|tree| (0..d - 1 - tree).map(|edge| f(tree, edge)).collect()).collect()
    }

    /// The dimension `d`.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.d
    }

    /// The permutation mapping natural-order position to original variable
    /// label, as stored in the underlying [`RVineMatrix`].
    #[must_use]
    pub fn order(&self) -> &[u32] {
        self.vine_matrix.order()
    }

    /// The raw structure matrix.
    #[must_use]
    pub const fn get_matrix(&self) -> &Array2<u32> {
        self.vine_matrix.matrix()
    }

    /// The pair-copula at tree `tree`, edge `edge`.
    #[must_use]
    pub fn get_pair_copula(&self, tree: usize, edge: usize) -> Option<&Bicop> {
        self.pair_copulas.get(tree).and_then(|row| row.get(edge))
    }

    /// Every pair-copula, by tree then edge.
    #[must_use]
    pub fn get_all_pair_copulas(&self) -> &[Vec<Bicop>] {
        &self.pair_copulas
    }

    /// The family at `(tree, edge)`.
    #[must_use]
    pub fn get_family(&self, tree: usize, edge: usize) -> Option<BicopFamily> {
        self.get_pair_copula(tree, edge).map(Bicop::family)
    }

    /// Every family, by tree then edge.
    #[must_use]
    pub fn get_all_families(&self) -> Vec<Vec<BicopFamily>> {
        self.pair_copulas.iter().map(|row| row.iter().map(Bicop::family).collect()).collect()
    }

    /// The rotation at `(tree, edge)`.
    #[must_use]
    pub fn get_rotation(&self, tree: usize, edge: usize) -> Option<u16> {
        self.get_pair_copula(tree, edge).map(Bicop::rotation)
    }

    /// Every rotation, by tree then edge.
    #[must_use]
    pub fn get_all_rotations(&self) -> Vec<Vec<u16>> {
        self.pair_copulas.iter().map(|row| row.iter().map(Bicop::rotation).collect()).collect()
    }

    /// The parameter vector at `(tree, edge)`.
    #[must_use]
    pub fn get_parameters(&self, tree: usize, edge: usize) -> Option<Vec<f64>> {
        self.get_pair_copula(tree, edge).map(|pc| pc.parameters().to_vec())
    }

    /// Joint density of `u` (`n x d`), one row per observation.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `u` does not have exactly `d` columns,
    /// or [`Error::Cancelled`] if `interrupt` fires.
    pub fn pdf(&self, u: ArrayView2<f64>, num_threads: usize, interrupt: InterruptHook<'_>) -> Result<Array1<f64>> {
        self.check_cols(u)?;
        let n = u.nrows();
        let batches = split_rows(n, num_threads.max(1));
        let run_batch = |range: std::ops::Range<usize>| -> Result<Vec<f64>> {
            let mut out = Vec::with_capacity(range.len());
            for (count, i) in range.enumerate() {
                if count % 100 == 0 {
                    check_interrupt(interrupt)?;
                }
                out.push(self.pdf_row(u.row(i)));
            }
            Ok(out)
        };
        let chunks: Vec<Result<Vec<f64>>> = if num_threads <= 1 {
            batches.into_iter().map(run_batch).collect()
        } else {
            batches.into_par_iter().map(run_batch).collect()
        };
        let mut flat = Vec::with_capacity(n);
        for chunk in chunks {
            flat.extend(chunk?);
        }
        Ok(Array1::from_vec(flat))
    }

    /// The cascade evaluator for a single row, following `Vinecop::pdf`'s
    /// tree-by-tree `hfunc1`/`hfunc2` update exactly.
    fn pdf_row(&self, u: ndarray::ArrayView1<f64>) -> f64 {
        let d = self.d;
        let revorder = self.revorder();
        let no_matrix = self.vine_matrix.in_natural_order();
        let max_matrix = self.vine_matrix.get_max_matrix();
        let needed1 = self.vine_matrix.get_needed_hfunc1();
        let needed2 = self.vine_matrix.get_needed_hfunc2();

        let mut hfunc1 = Array2::<f64>::zeros((d, d));
        let mut hfunc2 = Array2::<f64>::zeros((d, d));
        for j in 0..d {
            hfunc2[[0, j]] = u[(revorder[j] - 1) as usize];
        }

        let mut vine_density = 1.0;
        for tree in 0..(d - 1) {
            for edge in 0..(d - tree - 1) {
                let copula = &self.pair_copulas[tree][edge];
                let m = max_matrix[[tree, edge]] as usize;
                let u1 = hfunc2[[tree, edge]];
                let u2 = if m == no_matrix[[tree, edge]] as usize { hfunc2[[tree, d - m]] } else { hfunc1[[tree, d - m]] };

                vine_density *= copula.pdf(u1, u2);

                if needed1[[tree + 1, edge]] {
                    hfunc1[[tree + 1, edge]] = copula.hfunc1(u1, u2);
                }
                if needed2[[tree + 1, edge]] {
                    hfunc2[[tree + 1, edge]] = copula.hfunc2(u1, u2);
                }
            }
        }
        vine_density
    }

    /// `revorder[j] = order[d - 1 - j]`, the data column feeding natural-order
    /// column `j`.
    fn revorder(&self) -> Vec<u32> {
        self.vine_matrix.order().iter().rev().copied().collect()
    }

    fn check_cols(&self, u: ArrayView2<f64>) -> Result<()> {
        if u.ncols() != self.d {
            return Err(Error::Domain(format!("expected {} columns, got {}", self.d, u.ncols())));
        }
        Ok(())
    }

    /// Joint distribution of `u`, estimated by quasi-Monte Carlo: `C(u) =
    /// integral_{[0, u]} c(v) dv` is `volume([0, u])` times the average
    /// density over `n_qmc` Halton points scaled into the box `[0, u]`.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `u` does not have exactly `d` columns.
    pub fn cdf(&self, u: ArrayView2<f64>, n_qmc: usize, num_threads: usize) -> Result<Array1<f64>> {
        self.check_cols(u)?;
        let halton = halton_sequence(n_qmc, self.d, 0);
        let evaluate_row = |row: ndarray::ArrayView1<f64>| -> f64 {
            let volume: f64 = row.iter().product();
            let mean_density: f64 = halton
                .rows()
                .into_iter()
                .map(|sample| {
                    let scaled = Array1::from_shape_fn(self.d, |j| sample[j] * row[j]);
                    self.pdf_row(scaled.view())
                })
                .sum::<f64>()
                / n_qmc as f64;
            volume * mean_density
        };
        let rows: Vec<_> = u.rows().into_iter().collect();
        let values: Vec<f64> =
            if num_threads <= 1 { rows.iter().map(|r| evaluate_row(*r)).collect() } else { rows.into_par_iter().map(evaluate_row).collect() };
        Ok(Array1::from_vec(values))
    }

    /// Draws `n` samples via the inverse Rosenblatt transform of either a
    /// quasi-random Halton cube (`qrng = true`) or independent uniforms
    /// seeded from `seed` (defaulting to entropy).
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `interrupt` fires.
    pub fn simulate(
        &self,
        n: usize,
        qrng: bool,
        num_threads: usize,
        seed: Option<u64>,
        interrupt: InterruptHook<'_>,
    ) -> Result<Array2<f64>> {
        let uniform = if qrng {
            halton_sequence(n, self.d, 0)
        } else {
            let mut rng = seed.map_or_else(Pcg64::from_os_rng, Pcg64::seed_from_u64);
            Array2::from_shape_fn((n, self.d), |_| rng.random::<f64>())
        };
        self.inverse_rosenblatt(uniform.view(), num_threads, interrupt)
    }

    /// Log-likelihood of `data` under this vine, summed over rows.
    ///
    /// # Errors
    /// Propagates [`pdf`](Self::pdf)'s errors.
    pub fn loglik(&self, data: ArrayView2<f64>, num_threads: usize, interrupt: InterruptHook<'_>) -> Result<f64> {
        Ok(self.pdf(data, num_threads, interrupt)?.mapv(f64::ln).sum())
    }

    /// Number of free parameters, summed over every pair-copula.
    #[must_use]
    pub fn calculate_npars(&self) -> f64 {
        self.pair_copulas.iter().flatten().map(Bicop::calculate_npars).sum()
    }

    /// Akaike information criterion on `data`.
    ///
    /// # Errors
    /// Propagates [`loglik`](Self::loglik)'s errors.
    pub fn aic(&self, data: ArrayView2<f64>, num_threads: usize) -> Result<f64> {
        Ok(-2.0 * self.loglik(data, num_threads, None)? + 2.0 * self.calculate_npars())
    }

    /// Bayesian information criterion on `data`.
    ///
    /// # Errors
    /// Propagates [`loglik`](Self::loglik)'s errors.
    pub fn bic(&self, data: ArrayView2<f64>, num_threads: usize) -> Result<f64> {
        Ok(-2.0 * self.loglik(data, num_threads, None)? + self.calculate_npars() * (data.nrows() as f64).ln())
    }

    /// Modified Bayesian information criterion on `data`: [`Bicop::mbic`]'s
    /// prior applied per edge, with mass decaying by `psi0^(tree + 1)` in
    /// deeper trees (the same decay `tvine.hpp` applies to its own `psi0`
    /// across time-vine lags, generalized here across vine trees).
    ///
    /// # Errors
    /// Propagates [`loglik`](Self::loglik)'s errors.
    pub fn mbicv(&self, data: ArrayView2<f64>, psi0: f64, num_threads: usize) -> Result<f64> {
        let n = data.nrows() as f64;
        let loglik = self.loglik(data, num_threads, None)?;
        let mut log_prior = 0.0;
        for (tree, row) in self.pair_copulas.iter().enumerate() {
            let psi_t = psi0.powi(tree as i32 + 1);
            for pc in row {
                log_prior += if pc.family() == BicopFamily::Indep { (1.0 - psi_t).ln() } else { psi_t.ln() };
            }
        }
        Ok(-2.0 * loglik + self.calculate_npars() * n.ln() - 2.0 * log_prior)
    }

    /// Inverse Rosenblatt transform of `u` (`n x d`, entries in `[0, 1]`):
    /// the exact inverse of the cascade [`Self::pdf`] conditions on, used by
    /// [`Self::simulate`] to turn independent (or quasi-random) uniforms
    /// into draws from this vine.
    ///
    /// Follows `class.cpp`'s `inverse_rosenblatt` without its optional
    /// recursive row-splitting memory optimization: this crate always
    /// processes the full batch (split only across `num_threads`), trading
    /// the original's bounded working-set guarantee for a simpler
    /// implementation at the data sizes this crate targets.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `u` does not have exactly `d` columns,
    /// or [`Error::Cancelled`] if `interrupt` fires.
    pub fn inverse_rosenblatt(&self, u: ArrayView2<f64>, num_threads: usize, interrupt: InterruptHook<'_>) -> Result<Array2<f64>> {
        self.check_cols(u)?;
        let n = u.nrows();
        let batches = split_rows(n, num_threads.max(1));
        let run_batch = |range: std::ops::Range<usize>| -> Result<Vec<Vec<f64>>> {
            let mut out = Vec::with_capacity(range.len());
            for (count, i) in range.enumerate() {
                if count % 100 == 0 {
                    check_interrupt(interrupt)?;
                }
                out.push(self.inverse_rosenblatt_row(u.row(i)));
            }
            Ok(out)
        };
        let chunks: Vec<Result<Vec<Vec<f64>>>> = if num_threads <= 1 {
            batches.into_iter().map(run_batch).collect()
        } else {
            batches.into_par_iter().map(run_batch).collect()
        };

        let mut result = Array2::zeros((n, self.d));
        let mut row_idx = 0;
        for chunk in chunks {
            for row in chunk? {
                result.row_mut(row_idx).assign(&Array1::from_vec(row));
                row_idx += 1;
            }
        }
        Ok(result)
    }

    fn inverse_rosenblatt_row(&self, u: ndarray::ArrayView1<f64>) -> Vec<f64> {
        let d = self.d;
        let revorder = self.revorder();
        let max_matrix = self.vine_matrix.get_max_matrix();
        let needed1 = self.vine_matrix.get_needed_hfunc1();

        // `hinv2[[tree, var]]` / `hfunc1[[tree, var]]`, laid out exactly as
        // `class.cpp` does: row = tree level, column = natural-order variable.
        let mut hinv2 = Array2::<f64>::zeros((d, d));
        let mut hfunc1 = Array2::<f64>::zeros((d, d));
        for j in 0..d {
            hinv2[[d - j - 1, j]] = u[(revorder[j] - 1) as usize];
        }
        hfunc1[[0, d - 1]] = hinv2[[0, d - 1]];

        for var in (0..(d - 1)).rev() {
            for tree in (0..(d - var - 1)).rev() {
                let copula = &self.pair_copulas[tree][var];
                let m = max_matrix[[tree, var]] as usize;
                let no_matrix = self.vine_matrix.in_natural_order();
                let u1 = hinv2[[tree + 1, var]];
                let u2 = if m == no_matrix[[tree, var]] as usize { hinv2[[tree, d - m]] } else { hfunc1[[tree, d - m]] };

                hinv2[[tree, var]] = copula.hinv2(u2, u1);

                if var < d - 1 && needed1[[tree + 1, var]] {
                    hfunc1[[tree + 1, var]] = copula.hfunc1(hinv2[[tree, var]], u2);
                }
            }
        }

        let inverse_order = inverse_permutation(&revorder);
        (0..d).map(|j| hinv2[[0, inverse_order[j]]]).collect()
    }
}

/// The permutation `p` such that `values[p[0]] <= values[p[1]] <= ...`:
/// sorts `indices` by the value each one names in `values`.
fn inverse_permutation(values: &[u32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by_key(|&i| values[i]);
    indices
}

/// Splits `0..n` into `num_threads` roughly-equal contiguous ranges.
fn split_rows(n: usize, num_threads: usize) -> Vec<std::ops::Range<usize>> {
    let num_threads = num_threads.max(1).min(n.max(1));
    let batch = n.div_ceil(num_threads).max(1);
    let mut out = Vec::with_capacity(num_threads);
    let mut start = 0;
    while start < n {
        let end = (start + batch).min(n);
        out.push(start..end);
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Uniform};

    fn independent_data(n: usize, d: usize, seed: u64) -> Array2<f64> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let uniform = Uniform::new(0.0_f64, 1.0).unwrap();
        Array2::from_shape_fn((n, d), |_| uniform.sample(&mut rng))
    }

    #[test]
    fn independence_vine_has_uniform_pdf() {
        let vine = Vinecop::new(4).unwrap();
        let u = array![[0.2, 0.4, 0.6, 0.8], [0.1, 0.9, 0.3, 0.5]];
        let density = vine.pdf(u.view(), 1, None).unwrap();
        for value in density.iter() {
            assert!((value - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn simulate_then_pdf_stays_in_unit_cube_and_is_positive() {
        let vine = Vinecop::new(3).unwrap();
        let sample = vine.simulate(50, false, 1, Some(7), None).unwrap();
        for row in sample.rows() {
            for &value in row.iter() {
                assert!((0.0..=1.0).contains(&value));
            }
        }
        let density = vine.pdf(sample.view(), 1, None).unwrap();
        assert!(density.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn select_all_then_loglik_is_finite() {
        let data = independent_data(100, 4, 5);
        let controls = FitControlsVinecop::default();
        let vine = Vinecop::select_all(data.view(), &controls).unwrap();
        let ll = vine.loglik(data.view(), 1, None).unwrap();
        assert!(ll.is_finite());
    }

    #[test]
    fn select_truncation_level_picks_a_depth_at_most_the_untruncated_one() {
        let data = independent_data(150, 4, 9);
        let mut controls = FitControlsVinecop::default();
        controls.set_select_truncation_level(true);
        let truncated = Vinecop::select_all(data.view(), &controls).unwrap();

        let full = Vinecop::select_all(data.view(), &FitControlsVinecop::default()).unwrap();
        assert!(truncated.mbicv(data.view(), controls.psi0(), 1).unwrap() <= full.mbicv(data.view(), 0.9, 1).unwrap() + 1e-6);
    }

    #[test]
    fn select_families_on_fixed_structure_matches_dimension() {
        let data = independent_data(80, 3, 6);
        let matrix = RVineMatrix::construct_d_vine_matrix(&[1, 2, 3]).unwrap();
        let controls = FitControlsVinecop::default();
        let vine = Vinecop::select_families(data.view(), matrix, &controls).unwrap();
        assert_eq!(vine.dim(), 3);
        assert_eq!(vine.get_all_pair_copulas().len(), 2);
    }

    #[test]
    fn inverse_rosenblatt_round_trips_through_pdf() {
        let mut vine = Vinecop::new(3).unwrap();
        let mut strong = Bicop::new(BicopFamily::Gaussian);
        strong.set_parameters(&[0.7]).unwrap();
        vine.pair_copulas[0][0] = strong.clone();
        vine.pair_copulas[0][1] = strong;

        let u = independent_data(30, 3, 9);
        let simulated = vine.inverse_rosenblatt(u.view(), 1, None).unwrap();
        let density = vine.pdf(simulated.view(), 1, None).unwrap();
        assert!(density.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn interrupt_hook_cancels_pdf() {
        let vine = Vinecop::new(3).unwrap();
        let u = independent_data(10, 3, 1);
        let fired = std::cell::Cell::new(false);
        let hook = || {
            fired.set(true);
            true
        };
        let result = vine.pdf(u.view(), 1, Some(&hook));
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(fired.get());
    }

    #[test]
    fn from_structure_rejects_mismatched_staircase() {
        let matrix = RVineMatrix::construct_d_vine_matrix(&[1, 2, 3]).unwrap();
        let bad = vec![vec![Bicop::new(BicopFamily::Indep)]];
        assert!(Vinecop::from_structure(matrix, bad).is_err());
    }

    #[test]
    fn mbicv_is_finite_for_an_independence_vine() {
        let vine = Vinecop::new(3).unwrap();
        let data = independent_data(50, 3, 2);
        let value = vine.mbicv(data.view(), 0.9, 1).unwrap();
        assert!(value.is_finite());
    }
}
