//! The Gumbel (one-parameter Archimedean) copula.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::Result;

const BOUNDS: [(f64, f64); 1] = [(1.0, 200.0 - 1e-6)];

/// The Gumbel family engine, `phi(v) = (-ln v)^theta`.
#[derive(Clone, Copy, Debug)]
pub struct GumbelEngine {
    theta: f64,
}

impl Default for GumbelEngine {
    fn default() -> Self {
        Self { theta: 1.0 }
    }
}

impl GumbelEngine {
    /// Constructs an engine with the given generator parameter.
    #[must_use]
    pub const fn new(theta: f64) -> Self {
        Self { theta }
    }
}

impl ArchimedeanGenerator for GumbelEngine {
    fn phi(&self, v: f64) -> f64 {
        (-v.ln()).powf(self.theta)
    }

    fn phi_inv(&self, v: f64) -> f64 {
        (-v.powf(1.0 / self.theta)).exp()
    }

    fn phi_d1(&self, v: f64) -> f64 {
        let l = -v.ln();
        -self.theta * l.powf(self.theta - 1.0) / v
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let l = -v.ln();
        self.theta * (self.theta - 1.0 + l) * l.powf(self.theta - 2.0) / (v * v)
    }
}

impl BicopEngine for GumbelEngine {
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
        1.0 - 1.0 / self.theta
    }

    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>> {
        Ok(vec![1.0 / (1.0 - tau.abs())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn tau_round_trips() {
        let engine = GumbelEngine::new(2.5);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], 2.5, epsilon = 1e-8);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = GumbelEngine::new(2.0);
        let u1 = 0.4;
        let u2 = 0.6;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-5);
    }

    #[test]
    fn theta_one_is_independence() {
        let engine = GumbelEngine::new(1.0);
        assert_approx_eq!(f64, engine.parameters_to_tau(), 0.0, epsilon = 1e-10);
    }
}
