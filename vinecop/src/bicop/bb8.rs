//! The BB8 (two-parameter Archimedean) copula.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::{Error, Result};
use crate::quadrature::integrate_unit_interval;

const BOUNDS: [(f64, f64); 2] = [(1.0, 200.0 - 1e-6), (1e-4, 1.0 - 1e-6)];

/// The BB8 family engine, `phi(v) = -ln((1 - (1 - delta v)^theta) / (1 - (1-delta)^theta))`.
#[derive(Clone, Copy, Debug)]
pub struct Bb8Engine {
    params: [f64; 2],
}

impl Default for Bb8Engine {
    fn default() -> Self {
        Self { params: [1.0, 1.0] }
    }
}

impl Bb8Engine {
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

impl ArchimedeanGenerator for Bb8Engine {
    fn phi(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        -((1.0 - (1.0 - delta * v).powf(theta)) / (1.0 - (1.0 - delta).powf(theta))).ln()
    }

    fn phi_inv(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        (1.0 - (1.0 + (-v).exp() * ((1.0 - delta).powf(theta) - 1.0)).powf(1.0 / theta)) / delta
    }

    fn phi_d1(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        -delta * theta * (1.0 - delta * v).powf(theta - 1.0) / (1.0 - (1.0 - delta * v).powf(theta))
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let theta = self.theta();
        let delta = self.delta();
        let tmp = (1.0 - delta * v).powf(theta);
        delta * delta * theta * (1.0 - delta * v).powf(theta - 2.0) * (theta - 1.0 + tmp) / (tmp - 1.0).powi(2)
    }
}

impl BicopEngine for Bb8Engine {
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
        let integral = integrate_unit_interval(|t| {
            let tmp = (1.0 - t * delta).powf(theta);
            ((tmp - 1.0) / ((1.0 - delta).powf(theta) - 1.0)).ln() * (1.0 - t * delta - (1.0 - t * delta).powf(1.0 - theta))
        });
        1.0 - 4.0 / (delta * theta) * integral
    }

    fn tau_to_parameters(&self, _tau: f64) -> Result<Vec<f64>> {
        Err(Error::Parameter(
            "BB8 has two free parameters; there is no unique tau inverse".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinv1_inverts_h1() {
        let engine = Bb8Engine::new(1.5, 0.8);
        let u1 = 0.3;
        let u2 = 0.6;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert!((back - u2).abs() < 1e-4);
    }

    #[test]
    fn pdf_is_positive() {
        let engine = Bb8Engine::new(2.0, 0.5);
        assert!(engine.pdf(0.4, 0.6) > 0.0);
    }
}
