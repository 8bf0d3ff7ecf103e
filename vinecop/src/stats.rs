//! Dependence-measure primitives and (quasi-)random sampling helpers,
//! consumed by the pair-copula facade (MLE seeding) and the structure
//! selection algorithm (tree-edge weights).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Converts raw observations to pseudo-observations: each column is
/// replaced by its ranks divided by `n + 1`, matching `to_pseudo_obs`'s
/// "average" tie-handling (ties receive the mean rank of the tied block).
#[must_use]
pub fn to_pseudo_obs(data: ArrayView2<f64>) -> Array2<f64> {
    let (n, d) = data.dim();
    let mut out = Array2::zeros((n, d));
    for j in 0..d {
        out.column_mut(j).assign(&to_pseudo_obs_1d(data.column(j)));
    }
    out
}

/// Rank-transforms a single column to `(0, 1)` pseudo-observations.
#[must_use]
pub fn to_pseudo_obs_1d(column: ArrayView1<f64>) -> Array1<f64> {
    let n = column.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| column[a].partial_cmp(&column[b]).unwrap());

    let mut ranks = vec![0.0_f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && column[order[j + 1]] == column[order[i]] {
            j += 1;
        }
        // average rank (1-indexed) over the tied block [i, j]
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average_rank;
        }
        i = j + 1;
    }

    Array1::from_vec(ranks.into_iter().map(|r| r / (n as f64 + 1.0)).collect())
}

/// Kendall's tau between two columns, via the `O(n^2)` concordant/discordant
/// pair count (adequate for the `n` this crate targets; a merge-sort based
/// `O(n log n)` variant is not needed at this scale).
#[must_use]
pub fn pairwise_tau(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len();
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            let sign = dx * dy;
            if sign > 0.0 {
                concordant += 1;
            } else if sign < 0.0 {
                discordant += 1;
            }
        }
    }
    let total = (n * (n - 1) / 2) as f64;
    (concordant - discordant) as f64 / total
}

/// Pearson correlation between two columns.
#[must_use]
pub fn pairwise_cor(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let mean_x = x.mean().unwrap_or(0.0);
    let mean_y = y.mean().unwrap_or(0.0);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Spearman's rho: Pearson correlation of the pseudo-observation ranks.
#[must_use]
pub fn pairwise_rho(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let rx = to_pseudo_obs_1d(x);
    let ry = to_pseudo_obs_1d(y);
    pairwise_cor(rx.view(), ry.view())
}

/// Hoeffding's D, a rank-based measure of departure from independence more
/// sensitive to non-monotone dependence than tau/rho.
///
/// Follows `tools_stats.cpp::pairwise_hoeffd` exactly: ranks `R_i` of each
/// variable (1-indexed), bivariate ranks `Q_i` = count of points
/// dominated in both coordinates, and the combination
/// `D = (A - 2(n-2) B + (n-2)(n-3) C) / (n(n-1)(n-2)(n-3)(n-4))`.
#[must_use]
pub fn pairwise_hoeffd(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len();
    if n < 5 {
        return 0.0;
    }
    let rx: Vec<f64> = to_pseudo_obs_1d(x).iter().map(|p| p * (n as f64 + 1.0)).collect();
    let ry: Vec<f64> = to_pseudo_obs_1d(y).iter().map(|p| p * (n as f64 + 1.0)).collect();

    let mut q = vec![1.0_f64; n];
    for i in 0..n {
        let mut count = 0.0;
        for j in 0..n {
            if x[j] < x[i] && y[j] < y[i] {
                count += 1.0;
            }
        }
        q[i] = count;
    }

    let nf = n as f64;
    let mut a = 0.0;
    let mut b = 0.0;
    let mut c = 0.0;
    for i in 0..n {
        a += (rx[i] - 1.0) * (rx[i] - 2.0) * (ry[i] - 1.0) * (ry[i] - 2.0);
        b += (rx[i] - 2.0) * (ry[i] - 2.0) * q[i];
        c += q[i] * (q[i] - 1.0);
    }

    let denom = nf * (nf - 1.0) * (nf - 2.0) * (nf - 3.0) * (nf - 4.0);
    (a - 2.0 * (nf - 2.0) * b + (nf - 2.0) * (nf - 3.0) * c) / denom
}

/// Tie-breaking / MST weight criterion used during structure selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TreeCriterion {
    /// Kendall's tau.
    Tau,
    /// Spearman's rho.
    Rho,
    /// Hoeffding's D, rescaled to `[0, 1]` via `30D`, its approximate range.
    Hoeffd,
}

impl TreeCriterion {
    /// Evaluates this criterion on a pair of columns.
    #[must_use]
    pub fn evaluate(self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        match self {
            Self::Tau => pairwise_tau(x, y),
            Self::Rho => pairwise_rho(x, y),
            Self::Hoeffd => 30.0 * pairwise_hoeffd(x, y),
        }
    }
}

/// The `n`-th term (1-indexed) of the van der Corput sequence in the given
/// prime `base`: the standard building block of a Halton sequence.
#[must_use]
pub fn van_der_corput(mut n: u64, base: u64) -> f64 {
    let mut result = 0.0;
    let mut fraction = 1.0 / base as f64;
    while n > 0 {
        result += (n % base) as f64 * fraction;
        n /= base;
        fraction /= base as f64;
    }
    result
}

const PRIMES: [u64; 16] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// A `d`-dimensional Halton quasi-random sequence, one row per sample,
/// each coordinate drawn from the van der Corput sequence in a distinct
/// prime base, starting at index `skip + 1` (skipping the degenerate first
/// point at the origin, a standard practice for Halton sequences).
///
/// Used by [`crate::vinecop::Vinecop::cdf`]'s QMC estimator. Dimensions
/// above `PRIMES.len()` wrap around the prime list, accepting the
/// well-known correlation this introduces in very high dimensions; this
/// crate's target dimension range does not approach that regime.
#[must_use]
pub fn halton_sequence(n: usize, d: usize, skip: u64) -> Array2<f64> {
    let mut out = Array2::zeros((n, d));
    for row in 0..n {
        for col in 0..d {
            let base = PRIMES[col % PRIMES.len()];
            out[[row, col]] = van_der_corput(skip + row as u64 + 1, base);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use ndarray::array;

    #[test]
    fn pseudo_obs_preserves_order() {
        let x = array![3.0, 1.0, 2.0];
        let p = to_pseudo_obs_1d(x.view());
        assert!(p[1] < p[2]);
        assert!(p[2] < p[0]);
    }

    #[test]
    fn pseudo_obs_averages_ties() {
        let x = array![1.0, 1.0, 2.0];
        let p = to_pseudo_obs_1d(x.view());
        assert_approx_eq!(f64, p[0], p[1], epsilon = 1e-12);
    }

    #[test]
    fn perfectly_concordant_tau_is_one() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![10.0, 20.0, 30.0, 40.0];
        assert_approx_eq!(f64, pairwise_tau(x.view(), y.view()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn perfectly_discordant_tau_is_minus_one() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![40.0, 30.0, 20.0, 10.0];
        assert_approx_eq!(f64, pairwise_tau(x.view(), y.view()), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn halton_sequence_stays_in_unit_cube() {
        let seq = halton_sequence(50, 3, 0);
        for value in seq.iter() {
            assert!(*value >= 0.0 && *value < 1.0);
        }
    }

    #[test]
    fn halton_sequence_is_deterministic() {
        let a = halton_sequence(10, 2, 0);
        let b = halton_sequence(10, 2, 0);
        assert_eq!(a, b);
    }
}
