//! The Student t (elliptical) copula, parameterized by correlation `rho`
//! and degrees of freedom `nu`.

use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};

use crate::bicop::engine::{check_parameters, BicopEngine};
use crate::error::Result;

const BOUNDS: [(f64, f64); 2] = [(-1.0 + 1e-8, 1.0 - 1e-8), (2.0 + 1e-6, 50.0 - 1e-6)];

fn students_t(nu: f64) -> StudentsT {
    StudentsT::new(0.0, 1.0, nu).expect("degrees of freedom are validated by bounds before use")
}

/// `ln Gamma(a) - ln Gamma(b)`, computed in log-space for numerical
/// stability (mirrors the original `StableGammaDivision` helper).
fn stable_gamma_division(a: f64, b: f64) -> f64 {
    (statrs::function::gamma::ln_gamma(a) - statrs::function::gamma::ln_gamma(b)).exp()
}

/// The Student family engine.
#[derive(Clone, Debug)]
pub struct StudentEngine {
    params: [f64; 2],
}

impl Default for StudentEngine {
    fn default() -> Self {
        Self { params: [0.0, 30.0] }
    }
}

impl StudentEngine {
    /// Constructs an engine with the given correlation and degrees of freedom.
    #[must_use]
    pub const fn new(rho: f64, nu: f64) -> Self {
        Self { params: [rho, nu] }
    }

    const fn rho(&self) -> f64 {
        self.params[0]
    }

    const fn nu(&self) -> f64 {
        self.params[1]
    }
}

impl BicopEngine for StudentEngine {
    fn pdf(&self, u1: f64, u2: f64) -> f64 {
        let nu = self.nu();
        let rho = self.rho();
        let t_nu = students_t(nu);
        let t1 = t_nu.inverse_cdf(u1);
        let t2 = t_nu.inverse_cdf(u2);
        let one_minus_rho2 = 1.0 - rho * rho;

        let coef = stable_gamma_division((nu + 2.0) / 2.0, nu / 2.0)
            / (nu * std::f64::consts::PI * one_minus_rho2.sqrt() * t_nu.pdf(t1) * t_nu.pdf(t2));
        let quad = 1.0 + (t1 * t1 + t2 * t2 - 2.0 * rho * t1 * t2) / (nu * one_minus_rho2);
        (coef * quad.powf(-(nu + 2.0) / 2.0)).min(1e16)
    }

    fn cdf(&self, u1: f64, u2: f64) -> f64 {
        // Numerically integrate h1 along u1, matching the definition C(u1,u2) = int_0^u1 h2(s,u2) ds.
        crate::quadrature::integrate_interval(0.0, u1, |s| self.h2(s, u2))
    }

    fn h1(&self, u1: f64, u2: f64) -> f64 {
        if u1 == 0.0 || u2 == 0.0 {
            return 0.0;
        }
        let nu = self.nu();
        let rho = self.rho();
        let t_nu = students_t(nu);
        let t_cond = t_nu.inverse_cdf(u1);
        let t_other = t_nu.inverse_cdf(u2);
        let mu = rho * t_cond;
        let sigma2 = (nu + t_cond * t_cond) * (1.0 - rho * rho) / (nu + 1.0);
        let t_nu1 = students_t(nu + 1.0);
        t_nu1.cdf((t_other - mu) / sigma2.sqrt()).clamp(1e-10, 1.0 - 1e-10)
    }

    fn h2(&self, u1: f64, u2: f64) -> f64 {
        self.h1(u2, u1)
    }

    fn hinv1(&self, u1: f64, q: f64) -> f64 {
        let nu = self.nu();
        let rho = self.rho();
        let t_nu = students_t(nu);
        let t_nu1 = students_t(nu + 1.0);
        let t_cond = t_nu.inverse_cdf(u1);
        let sigma2 = (nu + t_cond * t_cond) * (1.0 - rho * rho) / (nu + 1.0);
        let mu = rho * t_cond;
        let target = sigma2.sqrt() * t_nu1.inverse_cdf(q) + mu;
        t_nu.cdf(target).clamp(1e-10, 1.0 - 1e-10)
    }

    fn hinv2(&self, u2: f64, q: f64) -> f64 {
        self.hinv1(u2, q)
    }

    fn parameters(&self) -> &[f64] {
        &self.params
    }

    fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        check_parameters(params, &BOUNDS)?;
        self.params[0] = params[0];
        self.params[1] = params[1];
        Ok(())
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &BOUNDS
    }

    fn parameters_to_tau(&self) -> f64 {
        (2.0 / std::f64::consts::PI) * self.rho().asin()
    }

    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>> {
        let rho = (std::f64::consts::PI / 2.0 * tau).sin();
        Ok(vec![rho, self.nu()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn tau_matches_the_closed_form_arcsine_relation() {
        let engine = StudentEngine::new(0.5, 8.0);
        assert_approx_eq!(
            f64,
            engine.parameters_to_tau(),
            (2.0 / std::f64::consts::PI) * 0.5_f64.asin(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn tau_to_parameters_preserves_nu() {
        let engine = StudentEngine::new(0.1, 12.0);
        let params = engine.tau_to_parameters(0.3).unwrap();
        assert_approx_eq!(f64, params[1], 12.0, epsilon = 1e-12);
    }

    #[test]
    fn hinv1_inverts_h1() {
        let engine = StudentEngine::new(0.4, 6.0);
        let u1 = 0.35;
        let u2 = 0.65;
        let q = engine.h1(u1, u2);
        let back = engine.hinv1(u1, q);
        assert_approx_eq!(f64, back, u2, epsilon = 1e-6);
    }

    #[test]
    fn pdf_is_symmetric_in_its_arguments() {
        let engine = StudentEngine::new(0.3, 10.0);
        assert_approx_eq!(f64, engine.pdf(0.2, 0.8), engine.pdf(0.8, 0.2), epsilon = 1e-8);
    }

    #[test]
    fn independence_like_nu_keeps_pdf_positive() {
        let engine = StudentEngine::new(0.0, 4.0);
        assert!(engine.pdf(0.3, 0.6) > 0.0);
    }
}
