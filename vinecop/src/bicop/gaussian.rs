//! The Gaussian (elliptical) copula, parameterized by correlation `rho`.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::bicop::engine::{check_parameters, BicopEngine};
use crate::error::Result;
use crate::quadrature::integrate_interval;

const BOUNDS: [(f64, f64); 1] = [(-1.0 + 1e-8, 1.0 - 1e-8)];

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are always valid")
}

/// The Gaussian family engine.
#[derive(Clone, Debug)]
pub struct GaussianEngine {
    rho: f64,
}

impl Default for GaussianEngine {
    fn default() -> Self {
        Self { rho: 0.0 }
    }
}

impl GaussianEngine {
    /// Constructs an engine with the given correlation.
    #[must_use]
    pub const fn new(rho: f64) -> Self {
        Self { rho }
    }
}

impl BicopEngine for GaussianEngine {
    fn pdf(&self, u1: f64, u2: f64) -> f64 {
        let normal = standard_normal();
        let t1 = normal.inverse_cdf(u1);
        let t2 = normal.inverse_cdf(u2);
        let rho = self.rho;
        let one_minus_rho2 = 1.0 - rho * rho;
        let density = (1.0 / (2.0 * std::f64::consts::PI * one_minus_rho2.sqrt()))
            * (-(t1 * t1 - 2.0 * rho * t1 * t2 + t2 * t2) / (2.0 * one_minus_rho2)).exp();
        let marginal = normal.pdf(t1) * normal.pdf(t2);
        (density / marginal).min(1e16)
    }

    fn cdf(&self, u1: f64, u2: f64) -> f64 {
        if u1 == 0.0 || u2 == 0.0 {
            return 0.0;
        }
        let normal = standard_normal();
        let h = normal.inverse_cdf(u1);
        let k = normal.inverse_cdf(u2);
        let base = normal.cdf(h) * normal.cdf(k);
        let contribution = integrate_interval(0.0, self.rho, |r| {
            let one_minus_r2 = 1.0 - r * r;
            (1.0 / (2.0 * std::f64::consts::PI * one_minus_r2.sqrt()))
                * (-(h * h - 2.0 * r * h * k + k * k) / (2.0 * one_minus_r2)).exp()
        });
        (base + contribution).clamp(1e-10, 1.0 - 1e-10)
    }

    fn h1(&self, u1: f64, u2: f64) -> f64 {
        if u1 == 0.0 || u2 == 0.0 {
            return 0.0;
        }
        let normal = standard_normal();
        let t1 = normal.inverse_cdf(u1);
        let t2 = normal.inverse_cdf(u2);
        let value = (t2 - self.rho * t1) / (1.0 - self.rho * self.rho).sqrt();
        normal.cdf(value).clamp(1e-10, 1.0 - 1e-10)
    }

    fn h2(&self, u1: f64, u2: f64) -> f64 {
        self.h1(u2, u1)
    }

    fn hinv1(&self, u1: f64, q: f64) -> f64 {
        let normal = standard_normal();
        let t1 = normal.inverse_cdf(u1);
        let value = normal.inverse_cdf(q) * (1.0 - self.rho * self.rho).sqrt() + self.rho * t1;
        normal.cdf(value).clamp(1e-10, 1.0 - 1e-10)
    }

    fn hinv2(&self, u2: f64, q: f64) -> f64 {
        self.hinv1(u2, q)
    }

    fn parameters(&self) -> &[f64] {
        std::slice::from_ref(&self.rho)
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        check_parameters(params, &BOUNDS)?;
        self.rho = params[0];
        Ok(())
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &BOUNDS
    }

    fn parameters_to_tau(&self) -> f64 {
        (2.0 / std::f64::consts::PI) * self.rho.asin()
    }

    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>> {
        Ok(vec![(std::f64::consts::PI / 2.0 * tau).sin()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn tau_matches_the_closed_form_arcsine_relation() {
        let engine = GaussianEngine::new(0.5);
        assert_approx_eq!(f64, engine.parameters_to_tau(), (2.0 / std::f64::consts::PI) * 0.5_f64.asin(), epsilon = 1e-10);
    }

    #[test]
    fn tau_round_trips() {
        let engine = GaussianEngine::new(0.5);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = GaussianEngine::new(0.5);
        let u1 = 0.3;
        let u2 = 0.7;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-6);
    }

    #[test]
    fn cdf_matches_marginal_at_u2_one() {
        let engine = GaussianEngine::new(0.3);
        assert_approx_eq!(f64, engine.cdf(0.4, 1.0 - 1e-10), 0.4, epsilon = 1e-3);
    }
}
