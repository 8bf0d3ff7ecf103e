//! The pair-copula engine contract (rotation-0 only) and the generic
//! Archimedean generator machinery every one-parameter-plus family builds
//! its `pdf`/`h1`/`h2` from.

use enum_dispatch::enum_dispatch;

use crate::error::{Error, Result};
use crate::quadrature::bisect;

/// Numerical clipping bound shared by every engine: inputs below `CLIP_LO`
/// or above `CLIP_HI` are pulled to the boundary before evaluation, except
/// NaNs, which propagate untouched.
pub const CLIP_LO: f64 = 1e-10;
/// See [`CLIP_LO`].
pub const CLIP_HI: f64 = 1.0 - CLIP_LO;

/// Clips `x` into `[CLIP_LO, CLIP_HI]`, passing NaN through unchanged.
#[must_use]
pub fn clip01(x: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.clamp(CLIP_LO, CLIP_HI)
    }
}

/// The density/CDF/h-function/tau contract every bivariate copula family
/// implements at rotation 0. The facade ([`crate::bicop::facade::Bicop`])
/// is the only place that knows about rotation; every engine only ever
/// sees un-rotated, clipped data.
#[enum_dispatch]
pub trait BicopEngine {
    /// Joint density at `(u1, u2)`.
    fn pdf(&self, u1: f64, u2: f64) -> f64;
    /// Joint distribution at `(u1, u2)`.
    fn cdf(&self, u1: f64, u2: f64) -> f64;
    /// `d/du1 C(u1, u2)`.
    fn h1(&self, u1: f64, u2: f64) -> f64;
    /// `d/du2 C(u1, u2)`.
    fn h2(&self, u1: f64, u2: f64) -> f64;
    /// The root in `v` of `h1(u1, v) = q`.
    fn hinv1(&self, u1: f64, q: f64) -> f64 {
        bisect(|v| self.h1(u1, v) - q, 1e-20, 1.0 - 1e-20, 1e-12, 35)
    }
    /// The root in `v` of `h2(v, u2) = q`.
    fn hinv2(&self, u2: f64, q: f64) -> f64 {
        bisect(|v| self.h2(v, u2) - q, 1e-20, 1.0 - 1e-20, 1e-12, 35)
    }
    /// Current parameter vector.
    fn parameters(&self) -> &[f64];
    /// Sets the parameter vector, validating against [`Self::bounds`].
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] on a size or bounds mismatch.
    fn set_parameters(&mut self, params: &[f64]) -> Result<()>;
    /// Per-parameter `(lower, upper)` bounds.
    fn bounds(&self) -> &[(f64, f64)];
    /// Kendall's tau implied by the current parameter vector.
    fn parameters_to_tau(&self) -> f64;
    /// The parameter vector whose `parameters_to_tau` is (closest to) `tau`.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if the family admits no well-defined
    /// inverse (not expected for any family currently registered in
    /// [`crate::family::BicopFamily::itau`]).
    fn tau_to_parameters(&self, tau: f64) -> Result<Vec<f64>>;
}

/// Validates a candidate parameter vector against per-parameter bounds,
/// the shared check every `set_parameters` implementation runs first.
///
/// # Errors
/// Returns [`Error::Parameter`] on a size or bounds mismatch.
pub fn check_parameters(params: &[f64], bounds: &[(f64, f64)]) -> Result<()> {
    if params.len() != bounds.len() {
        return Err(Error::Parameter(format!(
            "expected {} parameters, got {}",
            bounds.len(),
            params.len()
        )));
    }
    for (value, (lo, hi)) in params.iter().zip(bounds.iter()) {
        if !(*lo..=*hi).contains(value) {
            return Err(Error::Parameter(format!("parameter {value} is outside bounds [{lo}, {hi}]")));
        }
    }
    Ok(())
}

/// The Archimedean generator contract: `phi`, its inverse, and its first
/// two derivatives, all at the family's current parameter vector.
///
/// Given these four functions the generic `pdf`/`h1`/`h2` formulas below
/// are family-agnostic; this mirrors the structure of
/// `bicop_archimedean.cpp`'s shared superclass.
pub trait ArchimedeanGenerator {
    /// The generator `phi(v)`.
    fn phi(&self, v: f64) -> f64;
    /// Its inverse, `phi^-1(v)`.
    fn phi_inv(&self, v: f64) -> f64;
    /// Its first derivative, `phi'(v)`.
    fn phi_d1(&self, v: f64) -> f64;
    /// Its second derivative, `phi''(v)`.
    fn phi_d2(&self, v: f64) -> f64;
}

/// `pdf(u) = -phi'(u1) phi'(u2) phi''(t) / phi'(t)^3`, `t = phi^-1(phi(u1)+phi(u2))`.
pub fn archimedean_pdf(g: &impl ArchimedeanGenerator, u1: f64, u2: f64) -> f64 {
    let t = g.phi_inv(g.phi(u1) + g.phi(u2));
    let density = -g.phi_d1(u1) * g.phi_d1(u2) * g.phi_d2(t) / g.phi_d1(t).powi(3);
    density.min(1e16)
}

/// `h1(u1, u2) = phi'(u1) / phi'(t)`, `t = phi^-1(phi(u1)+phi(u2))`.
pub fn archimedean_h1(g: &impl ArchimedeanGenerator, u1: f64, u2: f64) -> f64 {
    let t = g.phi_inv(g.phi(u1) + g.phi(u2));
    g.phi_d1(u1) / g.phi_d1(t)
}

/// `h2(u1, u2) = h1(u2, u1)` (symmetric in the generator's arguments).
pub fn archimedean_h2(g: &impl ArchimedeanGenerator, u1: f64, u2: f64) -> f64 {
    archimedean_h1(g, u2, u1)
}

/// `cdf(u) = phi^-1(phi(u1) + phi(u2))`.
pub fn archimedean_cdf(g: &impl ArchimedeanGenerator, u1: f64, u2: f64) -> f64 {
    g.phi_inv(g.phi(u1) + g.phi(u2))
}
