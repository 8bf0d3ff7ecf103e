//! The nonparametric transformed-kernel (TLL0) family: a Gaussian-kernel
//! density estimate on Gaussian-transformed pseudo-observations, stored as a
//! bivariate interpolation grid once fit.

use ndarray::{Array1, Array2, ArrayView2};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::bicop::engine::BicopEngine;
use crate::error::{Error, Result};
use crate::interp_grid::InterpolationGrid;

const GRID_SIZE: usize = 30;

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are always valid")
}

/// Eigendecomposition-based square root of a symmetric 2x2 matrix `[[a, b],
/// [b, d]]`, returned as `[[a', b'], [b', d']]`.
fn sqrt_symmetric_2x2(a: f64, b: f64, d: f64) -> (f64, f64, f64) {
    let trace = a + d;
    let diff_half = (a - d) / 2.0;
    let radius = diff_half.hypot(b);
    let lambda1 = trace / 2.0 + radius;
    let lambda2 = trace / 2.0 - radius;
    let sqrt1 = lambda1.max(0.0).sqrt();
    let sqrt2 = lambda2.max(0.0).sqrt();

    if radius < 1e-12 {
        // already (numerically) a multiple of the identity
        return (sqrt1, 0.0, sqrt1);
    }
    // eigenvector for lambda1: (b, lambda1 - a), normalized
    let (mut vx, mut vy) = (b, lambda1 - a);
    let norm = vx.hypot(vy);
    if norm < 1e-12 {
        vx = 1.0;
        vy = 0.0;
    } else {
        vx /= norm;
        vy /= norm;
    }
    // the other eigenvector is orthogonal: (-vy, vx)
    let (wx, wy) = (-vy, vx);
    let a2 = vx * vx * sqrt1 + wx * wx * sqrt2;
    let b2 = vx * vy * sqrt1 + wx * wy * sqrt2;
    let d2 = vy * vy * sqrt1 + wy * wy * sqrt2;
    (a2, b2, d2)
}

/// The nonparametric family engine. Starts out as the independence density
/// until [`KernelEngine::fit`] is called.
#[derive(Clone, Debug, Default)]
pub struct KernelEngine {
    grid1: Option<InterpolationGrid>,
    grid2: Option<InterpolationGrid>,
    effective_npars: f64,
}

impl KernelEngine {
    /// Fits the kernel density on pseudo-observations `data` (n rows, 2
    /// columns), following the original's grid construction: a 30x30 grid
    /// equally spaced on the Gaussian scale, a plug-in bandwidth matrix
    /// `1.25 n^(-1/6) Sigma^(1/2)`, and a Gaussian product kernel evaluated
    /// at every grid point.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` has fewer than 2 rows.
    pub fn fit(&mut self, data: ArrayView2<f64>) -> Result<()> {
        let n = data.nrows();
        if n < 2 {
            return Err(Error::Domain("kernel fit needs at least 2 observations".to_string()));
        }
        let normal = standard_normal();
        let m = GRID_SIZE;

        let mut grid_points = Array1::<f64>::zeros(m);
        for i in 0..m {
            let raw = -3.25 + (i as f64) * (6.25 / m as f64);
            grid_points[i] = normal.cdf(raw);
        }

        let z_data: Array2<f64> = data.mapv(|u| normal.inverse_cdf(u.clamp(1e-10, 1.0 - 1e-10)));
        let mean0 = z_data.column(0).mean().unwrap_or(0.0);
        let mean1 = z_data.column(1).mean().unwrap_or(0.0);

        let mut cov00 = 0.0;
        let mut cov01 = 0.0;
        let mut cov11 = 0.0;
        for row in z_data.rows() {
            let c0 = row[0] - mean0;
            let c1 = row[1] - mean1;
            cov00 += c0 * c0;
            cov01 += c0 * c1;
            cov11 += c1 * c1;
        }
        let denom = (n - 1) as f64;
        cov00 /= denom;
        cov01 /= denom;
        cov11 /= denom;

        let (r00, r01, r11) = sqrt_symmetric_2x2(cov00, cov01, cov11);
        let scale = 1.25 * (n as f64).powf(-1.0 / 6.0);
        let (b00, b01, b11) = (scale * r00, scale * r01, scale * r11);
        let det_b = b00 * b11 - b01 * b01;
        let (inv00, inv01, inv11) = (b11 / det_b, -b01 / det_b, b00 / det_b);

        let apply_inv_b = |x: f64, y: f64| (inv00 * x + inv01 * y, inv01 * x + inv11 * y);

        let z_data_scaled: Vec<(f64, f64)> = z_data.rows().into_iter().map(|r| apply_inv_b(r[0], r[1])).collect();

        let mut values = Array2::<f64>::zeros((m, m));
        for i in 0..m {
            let gi = normal.inverse_cdf(grid_points[i].clamp(1e-10, 1.0 - 1e-10));
            let phi_i = normal.pdf(gi);
            for j in 0..m {
                let gj = normal.inverse_cdf(grid_points[j].clamp(1e-10, 1.0 - 1e-10));
                let phi_j = normal.pdf(gj);
                let (gx, gy) = apply_inv_b(gi, gj);

                let mut kernel_sum = 0.0;
                for &(zx, zy) in &z_data_scaled {
                    kernel_sum += normal.pdf(zx - gx) * normal.pdf(zy - gy);
                }
                let kernel_mean = kernel_sum / n as f64;
                values[[i, j]] = kernel_mean / (det_b.abs() * phi_i * phi_j);
            }
        }

        let mut grid_points_vec: Vec<f64> = grid_points.to_vec();
        grid_points_vec[0] = 0.0;
        grid_points_vec[m - 1] = 1.0;

        let grid1 = InterpolationGrid::new(grid_points_vec, values);
        let mut grid2 = grid1.clone();
        grid2.flip();

        let k0 = (2.0 * std::f64::consts::PI).recip();
        let mut weighted_pdf_sum = 0.0;
        for row in data.rows() {
            let u1 = row[0].clamp(1e-10, 1.0 - 1e-10);
            let u2 = row[1].clamp(1e-10, 1.0 - 1e-10);
            let zx = normal.inverse_cdf(u1);
            let zy = normal.inverse_cdf(u2);
            let scale_factor = normal.pdf(zx) * normal.pdf(zy);
            weighted_pdf_sum += scale_factor * grid1.interpolate(u1, u2);
        }
        let mean_weighted_pdf = weighted_pdf_sum / n as f64;
        self.effective_npars = k0 / det_b.abs() / mean_weighted_pdf;

        self.grid1 = Some(grid1);
        self.grid2 = Some(grid2);
        Ok(())
    }

    /// Effective number of parameters, computed during [`Self::fit`] (used
    /// by AIC/BIC instead of a fixed parameter count).
    #[must_use]
    pub const fn effective_npars(&self) -> f64 {
        self.effective_npars
    }
}

impl BicopEngine for KernelEngine {
    fn pdf(&self, u1: f64, u2: f64) -> f64 {
        self.grid1.as_ref().map_or(1.0, |g| g.interpolate(u1, u2))
    }

    fn cdf(&self, u1: f64, u2: f64) -> f64 {
        crate::quadrature::integrate_interval(0.0, u1, |s| self.h2(s, u2))
    }

    fn h1(&self, u1: f64, u2: f64) -> f64 {
        self.grid1.as_ref().map_or(u2, |g| g.integrate_1d(u1, u2, 1))
    }

    fn h2(&self, u1: f64, u2: f64) -> f64 {
        self.grid2.as_ref().map_or(u1, |g| g.integrate_1d(u2, u1, 1))
    }

    fn hinv1(&self, u1: f64, q: f64) -> f64 {
        self.grid1.as_ref().map_or(q, |g| g.inv_integrate_1d(u1, q, 1))
    }

    fn hinv2(&self, u2: f64, q: f64) -> f64 {
        self.grid2.as_ref().map_or(q, |g| g.inv_integrate_1d(u2, q, 1))
    }

    fn parameters(&self) -> &[f64] {
        &[]
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        if params.is_empty() {
            Ok(())
        } else {
            Err(Error::Parameter("the nonparametric family has no free parameter vector".to_string()))
        }
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &[]
    }

    fn parameters_to_tau(&self) -> f64 {
        let Some(grid) = self.grid1.as_ref() else {
            return 0.0;
        };
        // Kendall's tau = 4 E[C(U1, U2)] - 1, approximated on the grid nodes.
        let points = grid.grid_points();
        let mut sum = 0.0;
        for &u1 in points {
            for &u2 in points {
                sum += self.cdf(u1, u2);
            }
        }
        4.0 * sum / (points.len() * points.len()) as f64 - 1.0
    }

    fn tau_to_parameters(&self, _tau: f64) -> Result<Vec<f64>> {
        Err(Error::Parameter(
            "the nonparametric family is fit from data, not from a target tau".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn synthetic_data() -> Array2<f64> {
        // a simple deterministic grid standing in for pseudo-observations
        let mut flat = Vec::new();
        for i in 1..20 {
            let u = i as f64 / 20.0;
            flat.push(u);
            flat.push(u);
        }
        Array2::from_shape_vec((19, 2), flat).unwrap()
    }

    #[test]
    fn unfit_engine_behaves_like_independence() {
        let engine = KernelEngine::default();
        assert_eq!(engine.pdf(0.3, 0.7), 1.0);
        assert_eq!(engine.h1(0.3, 0.7), 0.7);
    }

    #[test]
    fn fitting_concordant_data_yields_positive_dependence() {
        let mut engine = KernelEngine::default();
        engine.fit(synthetic_data().view()).unwrap();
        assert!(engine.pdf(0.5, 0.5) > 0.5);
    }

    #[test]
    fn fit_rejects_too_few_observations() {
        let mut engine = KernelEngine::default();
        let data = array![[0.3, 0.4]];
        assert!(engine.fit(data.view()).is_err());
    }
}
