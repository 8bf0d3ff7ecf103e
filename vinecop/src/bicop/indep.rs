//! The independence copula: `C(u1, u2) = u1 * u2`.

use crate::bicop::engine::{check_parameters, BicopEngine};
use crate::error::Result;

/// The independence family engine. Carries no parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndepEngine;

impl BicopEngine for IndepEngine {
    fn pdf(&self, _u1: f64, _u2: f64) -> f64 {
        1.0
    }

    fn cdf(&self, u1: f64, u2: f64) -> f64 {
        u1 * u2
    }

    fn h1(&self, _u1: f64, u2: f64) -> f64 {
        u2
    }

    fn h2(&self, u1: f64, _u2: f64) -> f64 {
        u1
    }

    fn hinv1(&self, _u1: f64, q: f64) -> f64 {
        q
    }

    fn hinv2(&self, _u2: f64, q: f64) -> f64 {
        q
    }

    fn parameters(&self) -> &[f64] {
        &[]
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        check_parameters(params, &[])
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &[]
    }

    fn parameters_to_tau(&self) -> f64 {
        0.0
    }

    fn tau_to_parameters(&self, _tau: f64) -> Result<Vec<f64>> {
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_is_uniformly_one() {
        let engine = IndepEngine;
        assert_eq!(engine.pdf(0.3, 0.7), 1.0);
    }

    #[test]
    fn h1_returns_the_other_coordinate() {
        let engine = IndepEngine;
        assert_eq!(engine.h1(0.1, 0.4), 0.4);
        assert_eq!(engine.h2(0.1, 0.4), 0.1);
    }
}
