//! The Joe (one-parameter Archimedean) copula.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::Result;
use crate::quadrature::{bisect, digamma};

const BOUNDS: [(f64, f64); 1] = [(1.0, 200.0 - 1e-6)];

/// The Joe family engine, `phi(v) = -ln(1 - (1-v)^theta)`.
#[derive(Clone, Copy, Debug)]
pub struct JoeEngine {
    theta: f64,
}

impl Default for JoeEngine {
    fn default() -> Self {
        Self { theta: 1.0 }
    }
}

impl JoeEngine {
    /// Constructs an engine with the given generator parameter.
    #[must_use]
    pub const fn new(theta: f64) -> Self {
        Self { theta }
    }
}

impl ArchimedeanGenerator for JoeEngine {
    fn phi(&self, v: f64) -> f64 {
        -(1.0 - (1.0 - v).powf(self.theta)).ln()
    }

    fn phi_inv(&self, v: f64) -> f64 {
        1.0 - (1.0 - (-v).exp()).powf(1.0 / self.theta)
    }

    fn phi_d1(&self, v: f64) -> f64 {
        let w = 1.0 - v;
        -self.theta * w.powf(self.theta - 1.0) / (1.0 - w.powf(self.theta))
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let theta = self.theta;
        let w = 1.0 - v;
        let w_theta = w.powf(theta);
        theta * w.powf(theta - 2.0) * (w_theta - 1.0 + theta) / (w_theta - 1.0).powi(2)
    }
}

impl BicopEngine for JoeEngine {
    fn pdf(&self, u1: f64, u2: f64) -> f64 {
        archimedean_pdf(self, u1, u2)
    }

    fn cdf(&self, u1: f64, u2: f64) -> f64 {
        archimedean_cdf(self, u1, u2)
    }

    fn h1(&self, u1: f64, u2: f64) -> f64 {
        archimedean_h1(self, u1, u2)
    }

    fn h2(&self, u1: f64, u2: f64) -> f64 {
        archimedean_h2(self, u1, u2)
    }

    fn parameters(&self) -> &[f64] {
        std::slice::from_ref(&self.theta)
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        check_parameters(params, &BOUNDS)?;
        self.theta = params[0];
        Ok(())
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &BOUNDS
    }

    fn parameters_to_tau(&self) -> f64 {
        par_to_tau(self.theta)
    }

    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>> {
        let par = bisect(|par| par_to_tau(par) - tau, BOUNDS[0].0, BOUNDS[0].1, 1e-12, 60);
        Ok(vec![par])
    }
}

/// `tau(theta) = 1 + (2/(2-theta)) (psi(2) - psi(2/theta + 1))`, via the
/// digamma function (mirrors the original's use of `gsl_sf_psi`).
fn par_to_tau(par: f64) -> f64 {
    let shifted = 2.0 / par + 1.0;
    let d = digamma(2.0) - digamma(shifted);
    1.0 + 2.0 * d / (2.0 - par)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn theta_one_is_independence() {
        assert_approx_eq!(f64, par_to_tau(1.0), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn tau_round_trips() {
        let engine = JoeEngine::new(3.0);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = JoeEngine::new(2.0);
        let u1 = 0.3;
        let u2 = 0.6;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-5);
    }
}
