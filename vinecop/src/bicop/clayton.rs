//! The Clayton (one-parameter Archimedean) copula.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::Result;

const BOUNDS: [(f64, f64); 1] = [(1e-4, 200.0 - 1e-6)];

/// The Clayton family engine, `phi(v) = (v^-theta - 1) / theta`.
#[derive(Clone, Copy, Debug)]
pub struct ClaytonEngine {
    theta: f64,
}

impl Default for ClaytonEngine {
    fn default() -> Self {
        Self { theta: 1.0 }
    }
}

impl ClaytonEngine {
    /// Constructs an engine with the given generator parameter.
    #[must_use]
    pub const fn new(theta: f64) -> Self {
        Self { theta }
    }
}

impl ArchimedeanGenerator for ClaytonEngine {
    fn phi(&self, v: f64) -> f64 {
        (v.powf(-self.theta) - 1.0) / self.theta
    }

    fn phi_inv(&self, v: f64) -> f64 {
        (self.theta * v + 1.0).powf(-1.0 / self.theta)
    }

    fn phi_d1(&self, v: f64) -> f64 {
        -v.powf(-1.0 - self.theta)
    }

    fn phi_d2(&self, v: f64) -> f64 {
        (1.0 + self.theta) * v.powf(-2.0 - self.theta)
    }
}

impl BicopEngine for ClaytonEngine {
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

    fn hinv1(&self, u1: f64, q: f64) -> f64 {
        let theta = self.theta;
        if theta >= 75.0 {
            return crate::quadrature::bisect(|v| self.h1(u1, v) - q, 1e-20, 1.0 - 1e-20, 1e-12, 35);
        }
        let base = (q * u1.powf(theta + 1.0)).powf(-theta / (theta + 1.0)) - u1.powf(-theta) + 1.0;
        base.powf(-1.0 / theta).clamp(1e-10, 1.0 - 1e-10)
    }

    fn hinv2(&self, u2: f64, q: f64) -> f64 {
        self.hinv1(u2, q)
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
        self.theta / (2.0 + self.theta.abs())
    }

    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>> {
        Ok(vec![2.0 * tau / (1.0 - tau.abs())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn tau_round_trips() {
        let engine = ClaytonEngine::new(3.0);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = ClaytonEngine::new(2.0);
        let u1 = 0.3;
        let u2 = 0.6;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-6);
    }

    #[test]
    fn pdf_is_positive() {
        let engine = ClaytonEngine::new(1.5);
        assert!(engine.pdf(0.2, 0.8) > 0.0);
    }
}
