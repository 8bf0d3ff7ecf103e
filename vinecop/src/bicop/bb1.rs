//! The BB1 (two-parameter Archimedean) copula, nesting Clayton (`delta = 1`)
//! and Gumbel-like upper-tail behavior.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::{Error, Result};

const BOUNDS: [(f64, f64); 2] = [(1e-4, 200.0 - 1e-6), (1.0, 200.0 - 1e-6)];

/// The BB1 family engine, `phi(v) = (v^-theta - 1)^delta`.
#[derive(Clone, Copy, Debug)]
pub struct Bb1Engine {
    params: [f64; 2],
}

impl Default for Bb1Engine {
    fn default() -> Self {
        Self { params: [0.5, 1.0] }
    }
}

impl Bb1Engine {
    /// Constructs an engine with the given `(theta, delta)` parameters.
    #[must_use]
    pub const fn new(theta: f64, delta: f64) -> Self {
        Self { params: [theta, delta] }
    }

    const fn theta(&self) -> f64 {
        self.params[0]
    }

    const fn delta(&self) -> f64 {
        self.params[1]
    }
}

impl ArchimedeanGenerator for Bb1Engine {
    fn phi(&self, v: f64) -> f64 {
        (v.powf(-self.theta()) - 1.0).powf(self.delta())
    }

    fn phi_inv(&self, v: f64) -> f64 {
        (v.powf(1.0 / self.delta()) + 1.0).powf(-1.0 / self.theta())
    }

    fn phi_d1(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        -delta * theta * v.powf(-(1.0 + theta)) * (v.powf(-theta) - 1.0).powf(delta - 1.0)
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        let res = delta * theta * (v.powf(-theta) - 1.0).powf(delta) / (v.powf(theta) - 1.0).powi(2);
        res * (1.0 + delta * theta - (1.0 + theta) * v.powf(theta)) / (v * v)
    }
}

impl BicopEngine for Bb1Engine {
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
        &self.params
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        check_parameters(params, &BOUNDS)?;
        self.params = [params[0], params[1]];
        Ok(())
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &BOUNDS
    }

    fn parameters_to_tau(&self) -> f64 {
        1.0 - 2.0 / (self.delta() * (self.theta() + 2.0))
    }

    fn tau_to_parameters(&self, _tau: f64) -> Result<Vec<f64>> {
        Err(Error::Parameter(
            "BB1 has two free parameters; there is no unique tau inverse".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn hinv1_inverts_h1() {
        let engine = Bb1Engine::new(1.0, 2.0);
        let u1 = 0.3;
        let u2 = 0.7;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-5);
    }

    #[test]
    fn pdf_is_positive() {
        let engine = Bb1Engine::new(0.8, 1.5);
        assert!(engine.pdf(0.3, 0.5) > 0.0);
    }

    #[test]
    fn tau_to_parameters_is_unsupported() {
        let engine = Bb1Engine::default();
        assert!(engine.tau_to_parameters(0.3).is_err());
    }
}
