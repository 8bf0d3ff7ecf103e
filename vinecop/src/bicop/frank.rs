//! The Frank (one-parameter Archimedean) copula, the only family in this
//! group that admits negative dependence.

use crate::bicop::engine::{
    archimedean_cdf, archimedean_h1, archimedean_h2, archimedean_pdf, check_parameters, ArchimedeanGenerator, BicopEngine,
};
use crate::error::Result;
use crate::quadrature::{bisect, debye1};

const BOUNDS: [(f64, f64); 1] = [(-100.0 + 1e-6, 100.0 - 1e-6)];

/// The Frank family engine, `phi(v) = -ln((e^(-theta v) - 1) / (e^(-theta) - 1))`.
#[derive(Clone, Copy, Debug)]
pub struct FrankEngine {
    theta: f64,
}

impl Default for FrankEngine {
    fn default() -> Self {
        Self { theta: 1.0 }
    }
}

impl FrankEngine {
    /// Constructs an engine with the given generator parameter.
    #[must_use]
    pub const fn new(theta: f64) -> Self {
        Self { theta }
    }
}

impl ArchimedeanGenerator for FrankEngine {
    fn phi(&self, v: f64) -> f64 {
        let theta = self.theta;
        -(((-theta * v).exp() - 1.0) / ((-theta).exp() - 1.0)).ln()
    }

    fn phi_inv(&self, v: f64) -> f64 {
        let theta = self.theta;
        -1.0 / theta * (1.0 + ((-theta).exp() - 1.0) * (-v).exp()).ln()
    }

    fn phi_d1(&self, v: f64) -> f64 {
        self.theta / (1.0 - (self.theta * v).exp())
    }

    fn phi_d2(&self, v: f64) -> f64 {
        let half = 0.5 * self.theta * v;
        let diff = (-half).exp() - half.exp();
        self.theta * self.theta / (diff * diff)
    }
}

impl BicopEngine for FrankEngine {
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

/// `tau(theta) = 1 - 4/theta + (4/theta) D_1(|theta|)`, with the Debye term
/// shifted by `-theta/2` for negative `theta` (mirrors the sign fix-up in the
/// original `par_to_tau`).
fn par_to_tau(par: f64) -> f64 {
    if par.abs() < 1e-8 {
        return 0.0;
    }
    let mut d = debye1(par.abs());
    if par < 0.0 {
        d -= par / 2.0;
    }
    1.0 - 4.0 / par + (4.0 / par) * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn zero_theta_is_independence() {
        assert_approx_eq!(f64, par_to_tau(1e-10), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn tau_round_trips_for_positive_dependence() {
        let engine = FrankEngine::new(5.0);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], 5.0, epsilon = 1e-6);
    }

    #[test]
    fn tau_round_trips_for_negative_dependence() {
        let engine = FrankEngine::new(-5.0);
        let tau = engine.parameters_to_tau();
        let params = engine.tau_to_parameters(tau).unwrap();
        assert_approx_eq!(f64, params[0], -5.0, epsilon = 1e-6);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = FrankEngine::new(3.0);
        let u1 = 0.3;
        let u2 = 0.7;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-5);
    }
}
