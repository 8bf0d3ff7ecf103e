//! The BB6 (two-parameter Archimedean) copula.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::{Error, Result};
use crate::quadrature::integrate_unit_interval;

const BOUNDS: [(f64, f64); 2] = [(1.0, 200.0 - 1e-6), (1.0, 200.0 - 1e-6)];

/// The BB6 family engine, `phi(v) = (-ln(1 - (1-v)^theta))^delta`.
#[derive(Clone, Copy, Debug)]
pub struct Bb6Engine {
    params: [f64; 2],
}

impl Default for Bb6Engine {
    fn default() -> Self {
        Self { params: [1.0, 1.0] }
    }
}

impl Bb6Engine {
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

impl ArchimedeanGenerator for Bb6Engine {
    fn phi(&self, v: f64) -> f64 {
        (-(1.0 - (1.0 - v).powf(self.theta())).ln()).powf(self.delta())
    }

    fn phi_inv(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        1.0 - (1.0 - (-v.powf(1.0 / delta)).exp()).powf(1.0 / theta)
    }

    fn phi_d1(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        let res = delta * theta * (-(1.0 - (1.0 - v).powf(theta)).ln()).powf(delta - 1.0);
        res * (1.0 - v).powf(theta - 1.0) / ((1.0 - v).powf(theta) - 1.0)
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        let tmp = (1.0 - v).powf(theta);
        let res = (-(1.0 - tmp).ln()).powf(delta - 2.0)
            * ((delta - 1.0) * theta * tmp - (tmp + theta - 1.0) * (1.0 - tmp).ln());
        res * delta * theta * (1.0 - v).powf(theta - 2.0) / (tmp - 1.0).powi(2)
    }
}

impl BicopEngine for Bb6Engine {
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
        let theta = self.theta();
        let delta = self.delta();
        let integral = integrate_unit_interval(|v| {
            -4.0 / (delta * theta)
                * (1.0 - (1.0 - v).powf(theta)).ln()
                * (1.0 - v - (1.0 - v).powf(-theta) + (1.0 - v).powf(-theta) * v)
        });
        1.0 + integral
    }

    fn tau_to_parameters(&self, _tau: f64) -> Result<Vec<f64>> {
        Err(Error::Parameter(
            "BB6 has two free parameters; there is no unique tau inverse".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinv1_inverts_h1() {
        let engine = Bb6Engine::new(1.5, 1.5);
        let u1 = 0.3;
        let u2 = 0.6;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert!((back - u2).abs() < 1e-4);
    }

    #[test]
    fn pdf_is_positive() {
        let engine = Bb6Engine::new(2.0, 1.3);
        assert!(engine.pdf(0.4, 0.6) > 0.0);
    }

    #[test]
    fn tau_is_positive_for_nontrivial_parameters() {
        let engine = Bb6Engine::new(2.0, 1.3);
        assert!(engine.parameters_to_tau() > 0.0);
    }
}
