//! [`Bicop`]: the rotation-aware handle wrapping one family engine.
//!
//! Every engine in [`crate::bicop`] only ever sees un-rotated, clipped
//! `(u1, u2)` pairs (see [`crate::bicop::engine::BicopEngine`]'s doc
//! comment). This module is the one place that knows about the four
//! rotations, about fitting a family to data, and about picking the best
//! family out of a candidate set.

use enum_dispatch::enum_dispatch;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::bicop::bb1::Bb1Engine;
use crate::bicop::bb6::Bb6Engine;
use crate::bicop::bb7::Bb7Engine;
use crate::bicop::bb8::Bb8Engine;
use crate::bicop::clayton::ClaytonEngine;
use crate::bicop::controls::{FitControlsBicop, ParametricMethod, SelectionCriterion};
use crate::bicop::engine::BicopEngine;
use crate::bicop::frank::FrankEngine;
use crate::bicop::gaussian::GaussianEngine;
use crate::bicop::gumbel::GumbelEngine;
use crate::bicop::indep::IndepEngine;
use crate::bicop::joe::JoeEngine;
use crate::bicop::kernel::KernelEngine;
use crate::bicop::student::StudentEngine;
use crate::error::{Error, Result};
use crate::family::{BicopFamily, VarType};
use crate::optim::{minimize_bounded, OptimControls};
use crate::stats::{pairwise_cor, pairwise_tau};

/// The valid rotations, counter-clockwise, in degrees.
const ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Negative log-likelihood of `candidate` on `data`, each observation's
/// contribution scaled by `weights[i]` when given (unweighted otherwise).
/// `+inf` whenever the sum is non-finite, so `minimize_bounded` steers away
/// from singular boundaries.
fn weighted_neg_loglik(candidate: &Bicop, data: ArrayView2<f64>, weights: Option<&[f64]>) -> f64 {
    let ll: f64 = match weights {
        Some(w) if w.len() == data.nrows() => {
            data.rows().into_iter().zip(w).map(|(row, wi)| wi * candidate.pdf(row[0], row[1]).ln()).sum()
        }
        _ => data.rows().into_iter().map(|row| candidate.pdf(row[0], row[1]).ln()).sum(),
    };
    if ll.is_finite() {
        -ll
    } else {
        f64::INFINITY
    }
}

#[enum_dispatch(BicopEngine)]
#[derive(Clone, Debug)]
enum Engine {
    Indep(IndepEngine),
    Gaussian(GaussianEngine),
    Student(StudentEngine),
    Clayton(ClaytonEngine),
    Gumbel(GumbelEngine),
    Frank(FrankEngine),
    Joe(JoeEngine),
    Bb1(Bb1Engine),
    Bb6(Bb6Engine),
    Bb7(Bb7Engine),
    Bb8(Bb8Engine),
    Tll0(KernelEngine),
}

impl Engine {
    fn new(family: BicopFamily) -> Self {
        match family {
            BicopFamily::Indep => Self::Indep(IndepEngine),
            BicopFamily::Gaussian => Self::Gaussian(GaussianEngine::default()),
            BicopFamily::Student => Self::Student(StudentEngine::default()),
            BicopFamily::Clayton => Self::Clayton(ClaytonEngine::default()),
            BicopFamily::Gumbel => Self::Gumbel(GumbelEngine::default()),
            BicopFamily::Frank => Self::Frank(FrankEngine::default()),
            BicopFamily::Joe => Self::Joe(JoeEngine::default()),
            BicopFamily::Bb1 => Self::Bb1(Bb1Engine::default()),
            BicopFamily::Bb6 => Self::Bb6(Bb6Engine::default()),
            BicopFamily::Bb7 => Self::Bb7(Bb7Engine::default()),
            BicopFamily::Bb8 => Self::Bb8(Bb8Engine::default()),
            BicopFamily::Tll0 => Self::Tll0(KernelEngine::default()),
        }
    }
}

/// A single, possibly-rotated bivariate copula.
///
/// `Bicop` is the unit a vine copula's edges are built from: a family, a
/// rotation in `{0, 90, 180, 270}`, and that family's current parameter
/// vector (empty for the nonparametric family).
#[derive(Clone, Debug)]
pub struct Bicop {
    family: BicopFamily,
    rotation: u16,
    engine: Engine,
    /// Cached diagnostics from the last successful [`Self::fit`]/[`Self::select`]
    /// call; `None` until then.
    fitted: Option<FittedDiagnostics>,
}

#[derive(Clone, Copy, Debug)]
struct FittedDiagnostics {
    nobs: usize,
    loglik: f64,
}

impl Bicop {
    /// Constructs a `Bicop` at the family's default parameters and
    /// rotation 0.
    #[must_use]
    pub fn new(family: BicopFamily) -> Self {
        Self { family, rotation: 0, engine: Engine::new(family), fitted: None }
    }

    /// This crate only ever constructs continuous-margin copulas; see
    /// [`VarType`].
    #[must_use]
    pub const fn var_type(&self) -> VarType {
        VarType::Continuous
    }

    /// Number of observations from the last successful [`Self::fit`] or
    /// [`Self::select`] call.
    ///
    /// # Errors
    /// Returns [`Error::State`] if this `Bicop` has never been fitted.
    pub fn nobs(&self) -> Result<usize> {
        self.fitted.map(|f| f.nobs).ok_or_else(|| Error::State("nobs requested before fitting".to_string()))
    }

    /// Log-likelihood from the last successful [`Self::fit`] or
    /// [`Self::select`] call.
    ///
    /// # Errors
    /// Returns [`Error::State`] if this `Bicop` has never been fitted.
    pub fn fitted_loglik(&self) -> Result<f64> {
        self.fitted.map(|f| f.loglik).ok_or_else(|| Error::State("loglik requested before fitting".to_string()))
    }

    /// Constructs a `Bicop` at a given rotation.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `rotation` is not one of `{0, 90,
    /// 180, 270}`, or if `rotation != 0` is requested for a family in
    /// [`BicopFamily::rotationless`].
    pub fn with_rotation(family: BicopFamily, rotation: u16) -> Result<Self> {
        let mut bicop = Self::new(family);
        bicop.set_rotation(rotation)?;
        Ok(bicop)
    }

    /// The family.
    #[must_use]
    pub const fn family(&self) -> BicopFamily {
        self.family
    }

    /// The rotation, in `{0, 90, 180, 270}`.
    #[must_use]
    pub const fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Swaps the roles of `u1` and `u2`.
    ///
    /// Every family here is exchangeable at rotation 0 and 180 (an
    /// Archimedean or elliptical generator never distinguishes its two
    /// arguments), so flipping only has an effect at rotation 90/270,
    /// where it swaps which variable carries the upper- versus
    /// lower-tail asymmetry. Structure selection calls this whenever it
    /// re-keys an edge copula to the other one of its two conditioned
    /// variables while reassembling the R-vine matrix column by column.
    pub fn flip(&mut self) {
        self.rotation = match self.rotation {
            90 => 270,
            270 => 90,
            other => other,
        };
    }

    /// Sets the rotation.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `rotation` is not one of `{0, 90,
    /// 180, 270}`, or if `rotation != 0` is requested for a family in
    /// [`BicopFamily::rotationless`].
    pub fn set_rotation(&mut self, rotation: u16) -> Result<()> {
        if !ROTATIONS.contains(&rotation) {
            return Err(Error::Parameter(format!("rotation must be one of 0, 90, 180, 270, got {rotation}")));
        }
        if rotation != 0 && BicopFamily::rotationless().contains(&self.family) {
            return Err(Error::Parameter(format!("{} never uses a rotation other than 0", self.family)));
        }
        self.rotation = rotation;
        Ok(())
    }

    /// Current parameter vector.
    #[must_use]
    pub fn parameters(&self) -> &[f64] {
        self.engine.parameters()
    }

    /// Per-parameter `(lower, upper)` bounds.
    #[must_use]
    pub fn bounds(&self) -> &[(f64, f64)] {
        self.engine.bounds()
    }

    /// Sets the parameter vector.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] on a size or bounds mismatch.
    pub fn set_parameters(&mut self, params: &[f64]) -> Result<()> {
        self.engine.set_parameters(params)
    }

    /// Rotates `(u1, u2)` into the family's own rotation-0 frame and clips
    /// to the engine's numerical domain.
    fn cut_and_rotate(&self, u1: f64, u2: f64) -> (f64, f64) {
        let (v1, v2) = match self.rotation {
            0 => (u1, u2),
            90 => (u2, 1.0 - u1),
            180 => (1.0 - u1, 1.0 - u2),
            270 => (1.0 - u2, u1),
            _ => unreachable!("rotation is validated at construction"),
        };
        (crate::bicop::engine::clip01(v1), crate::bicop::engine::clip01(v2))
    }

    /// Joint density at `(u1, u2)`, capped at `1e16` for numerical safety
    /// near a family's singular boundary.
    #[must_use]
    pub fn pdf(&self, u1: f64, u2: f64) -> f64 {
        let (v1, v2) = self.cut_and_rotate(u1, u2);
        self.engine.pdf(v1, v2).min(1e16)
    }

    /// Joint distribution at `(u1, u2)`.
    ///
    /// Derived from the rotation-0 `cdf` via the standard rotated/survival
    /// copula identities (the original implementation only rotates the
    /// density and h-functions; these identities fall out of integrating
    /// the rotated `hfunc1` switch below over its first argument).
    #[must_use]
    pub fn cdf(&self, u1: f64, u2: f64) -> f64 {
        match self.rotation {
            0 => self.engine.cdf(u1, u2),
            90 => u2 - self.engine.cdf(u2, 1.0 - u1),
            180 => u1 + u2 - 1.0 + self.engine.cdf(1.0 - u1, 1.0 - u2),
            270 => u1 - self.engine.cdf(1.0 - u2, u1),
            _ => unreachable!("rotation is validated at construction"),
        }
    }

    /// `d/du1 C(u1, u2)`.
    #[must_use]
    pub fn hfunc1(&self, u1: f64, u2: f64) -> f64 {
        let (v1, v2) = self.cut_and_rotate(u1, u2);
        match self.rotation {
            0 => self.engine.h1(v1, v2),
            90 => self.engine.h2(v1, v2),
            180 => 1.0 - self.engine.h1(v1, v2),
            270 => 1.0 - self.engine.h2(v1, v2),
            _ => unreachable!("rotation is validated at construction"),
        }
    }

    /// `d/du2 C(u1, u2)`.
    #[must_use]
    pub fn hfunc2(&self, u1: f64, u2: f64) -> f64 {
        let (v1, v2) = self.cut_and_rotate(u1, u2);
        match self.rotation {
            0 => self.engine.h2(v1, v2),
            90 => 1.0 - self.engine.h1(v1, v2),
            180 => 1.0 - self.engine.h2(v1, v2),
            270 => self.engine.h1(v1, v2),
            _ => unreachable!("rotation is validated at construction"),
        }
    }

    /// The root in `v` of `hfunc1(u1, v) = q`.
    #[must_use]
    pub fn hinv1(&self, u1: f64, q: f64) -> f64 {
        let (v1, v2) = self.cut_and_rotate(u1, q);
        match self.rotation {
            0 => self.engine.hinv1(v1, v2),
            90 => self.engine.hinv2(v1, v2),
            180 => 1.0 - self.engine.hinv1(v1, v2),
            270 => 1.0 - self.engine.hinv2(v1, v2),
            _ => unreachable!("rotation is validated at construction"),
        }
    }

    /// The root in `v` of `hfunc2(v, u2) = q`.
    #[must_use]
    pub fn hinv2(&self, u2: f64, q: f64) -> f64 {
        let (v1, v2) = self.cut_and_rotate(q, u2);
        match self.rotation {
            0 => self.engine.hinv2(v1, v2),
            90 => 1.0 - self.engine.hinv1(v1, v2),
            180 => 1.0 - self.engine.hinv2(v1, v2),
            270 => self.engine.hinv1(v1, v2),
            _ => unreachable!("rotation is validated at construction"),
        }
    }

    /// Kendall's tau implied by the current parameter vector and rotation.
    #[must_use]
    pub fn parameters_to_tau(&self) -> f64 {
        let tau = self.engine.parameters_to_tau();
        if (self.rotation == 90 || self.rotation == 270) && BicopFamily::flip_by_rotation().contains(&self.family) {
            -tau
        } else {
            tau
        }
    }

    /// Draws `n` samples via the inverse Rosenblatt transform: `u1`
    /// uniform, `u2 = hinv1(u1, q)` for an independent uniform `q`.
    #[must_use]
    pub fn simulate(&self, n: usize, rng: &mut impl Rng) -> Array2<f64> {
        let mut out = Array2::zeros((n, 2));
        for mut row in out.rows_mut() {
            let u1: f64 = rng.random();
            let q: f64 = rng.random();
            row[0] = u1;
            row[1] = self.hinv1(u1, q);
        }
        out
    }

    /// Per-observation log-density, summed.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns.
    pub fn loglik(&self, data: ArrayView2<f64>) -> Result<f64> {
        if data.ncols() != 2 {
            return Err(Error::Domain(format!("expected 2 columns, got {}", data.ncols())));
        }
        Ok(data.rows().into_iter().map(|row| self.pdf(row[0], row[1]).ln()).sum())
    }

    /// Number of free parameters (the nonparametric family reports an
    /// effective count derived from its fitted bandwidth instead).
    #[must_use]
    pub fn calculate_npars(&self) -> f64 {
        match &self.engine {
            Engine::Tll0(kernel) => kernel.effective_npars(),
            _ => self.family.n_parameters() as f64,
        }
    }

    /// Akaike information criterion on `data`.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns.
    pub fn aic(&self, data: ArrayView2<f64>) -> Result<f64> {
        Ok(-2.0 * self.loglik(data)? + 2.0 * self.calculate_npars())
    }

    /// Bayesian information criterion on `data`.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns.
    pub fn bic(&self, data: ArrayView2<f64>) -> Result<f64> {
        Ok(-2.0 * self.loglik(data)? + self.calculate_npars() * (data.nrows() as f64).ln())
    }

    /// Modified Bayesian information criterion on `data`: `bic` penalized by
    /// a prior favoring independence, with prior mass `1 - psi0` on
    /// independence and `psi0` spread over every non-independence family.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns.
    pub fn mbic(&self, data: ArrayView2<f64>, psi0: f64) -> Result<f64> {
        let prior = if self.family == BicopFamily::Indep { (1.0 - psi0).ln() } else { psi0.ln() };
        Ok(-2.0 * self.loglik(data)? + self.calculate_npars() * (data.nrows() as f64).ln() - 2.0 * prior)
    }

    /// Fits this family's parameters (at the current rotation) to `data`.
    ///
    /// `"itau"` inverts the empirical Kendall's tau for families with a
    /// unique tau inverse, and otherwise (and always for `"mle"`) maximizes
    /// the log-likelihood over the bounded parameter box via
    /// [`minimize_bounded`], seeded from the itau estimate when one exists.
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns,
    /// or [`Error::State`] if `data` has fewer than 2 rows.
    pub fn fit(&mut self, data: ArrayView2<f64>, controls: &FitControlsBicop) -> Result<()> {
        self.fit_params(data, controls)?;
        self.fitted = Some(FittedDiagnostics { nobs: data.nrows(), loglik: self.loglik(data)? });
        Ok(())
    }

    fn fit_params(&mut self, data: ArrayView2<f64>, controls: &FitControlsBicop) -> Result<()> {
        if data.ncols() != 2 {
            return Err(Error::Domain(format!("expected 2 columns, got {}", data.ncols())));
        }
        if data.nrows() < 2 {
            return Err(Error::State("fitting needs at least 2 observations".to_string()));
        }

        if let Engine::Tll0(kernel) = &mut self.engine {
            return kernel.fit(data);
        }

        let tau = pairwise_tau(data.column(0), data.column(1));
        let seed = self.engine.tau_to_parameters(tau).ok();

        let use_itau_only = matches!(controls.parametric_method(), ParametricMethod::Itau) && self.bounds().len() == 1;

        if use_itau_only {
            if let Some(params) = seed {
                self.set_parameters(&params)?;
                return Ok(());
            }
        }

        let bounds = self.bounds().to_vec();
        if bounds.is_empty() {
            return Ok(());
        }

        let weights = controls.weights();

        // Student's nu has no itau inverse and a near-flat joint likelihood
        // surface in rho: fix rho at the tau-based estimate and profile out
        // only nu, rather than searching the full (rho, nu) box.
        if self.family == BicopFamily::Student {
            if let Some(params) = seed {
                return self.fit_student_profile_nu(data, weights, &params, &bounds);
            }
        }

        let lower: Vec<f64> = bounds.iter().map(|(lo, _)| *lo).collect();
        let upper: Vec<f64> = bounds.iter().map(|(_, hi)| *hi).collect();
        let x0 = seed.unwrap_or_else(|| self.parameters().to_vec());

        // `minimize_bounded` requires `Fn`, not `FnMut`, so the mutable trial
        // copy lives behind a `RefCell` the closure only ever borrows.
        let trial = std::cell::RefCell::new(self.clone());
        let objective = move |params: &[f64]| -> f64 {
            let mut candidate = trial.borrow_mut();
            if candidate.set_parameters(params).is_err() {
                return f64::INFINITY;
            }
            weighted_neg_loglik(&candidate, data, weights)
        };
        let fitted = minimize_bounded(objective, &x0, &lower, &upper, OptimControls::default());
        self.set_parameters(&fitted)
    }

    /// Profile-likelihood fit for Student: `rho` fixed at `seed[0]` (the
    /// tau-based estimate), `nu` optimized alone over its bound.
    fn fit_student_profile_nu(
        &mut self,
        data: ArrayView2<f64>,
        weights: Option<&[f64]>,
        seed: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<()> {
        let rho = seed[0];
        let (nu_lower, nu_upper) = bounds[1];

        let trial = std::cell::RefCell::new(self.clone());
        let objective = move |params: &[f64]| -> f64 {
            let mut candidate = trial.borrow_mut();
            if candidate.set_parameters(&[rho, params[0]]).is_err() {
                return f64::INFINITY;
            }
            weighted_neg_loglik(&candidate, data, weights)
        };
        let nu0 = seed.get(1).copied().unwrap_or(nu_lower.max(4.0).min(nu_upper));
        let fitted_nu = minimize_bounded(objective, &[nu0], &[nu_lower], &[nu_upper], OptimControls::default());
        self.set_parameters(&[rho, fitted_nu[0]])
    }

    /// Selects the best-fitting family and rotation for `data` out of
    /// `controls.family_set()`, by `controls.selection_criterion()`.
    ///
    /// Candidate rotations for a family in [`BicopFamily::flip_by_rotation`]
    /// are `{0, 180}` when the data's empirical Kendall's tau is
    /// nonnegative and `{90, 270}` otherwise; all other families are only
    /// tried at rotation 0. When `controls.preselect_families()` is set,
    /// Clayton/Gumbel/Joe are narrowed further to the single rotation of
    /// that pair consistent with the sign of `c1 - c2`, the lower- minus
    /// upper-quadrant Pearson correlation on the inverse-normal scale (BB
    /// families are left at both candidates: the tau-sign split above
    /// already enforces their half of the rule).
    ///
    /// Candidates are fit and scored fanned out across
    /// `controls.num_threads()` threads (serially when it is 1).
    ///
    /// # Errors
    /// Returns [`Error::Domain`] if `data` does not have exactly 2 columns,
    /// or [`Error::State`] if `data` has fewer than 2 rows or if no
    /// candidate family could be fit.
    pub fn select(data: ArrayView2<f64>, controls: &FitControlsBicop) -> Result<Self> {
        if data.ncols() != 2 {
            return Err(Error::Domain(format!("expected 2 columns, got {}", data.ncols())));
        }
        if data.nrows() < 2 {
            return Err(Error::State("selection needs at least 2 observations".to_string()));
        }

        let tau = pairwise_tau(data.column(0), data.column(1));
        let tail_asymmetry =
            controls.preselect_families().then(|| tail_scatter_asymmetry(data.column(0), data.column(1)));

        let mut candidates: Vec<(BicopFamily, u16)> = Vec::new();
        for &family in controls.family_set() {
            let rotations: Vec<u16> = if BicopFamily::rotationless().contains(&family) {
                vec![0]
            } else if BicopFamily::flip_by_rotation().contains(&family) {
                let base: [u16; 2] = if tau >= 0.0 { [0, 180] } else { [90, 270] };
                match tail_asymmetry {
                    Some(c1_minus_c2) if matches!(family, BicopFamily::Clayton | BicopFamily::Gumbel | BicopFamily::Joe) => {
                        vec![preferred_rotation(base, c1_minus_c2)]
                    }
                    _ => base.to_vec(),
                }
            } else {
                ROTATIONS.to_vec()
            };
            candidates.extend(rotations.into_iter().map(|rotation| (family, rotation)));
        }

        let evaluate = |(family, rotation): (BicopFamily, u16)| -> Option<(Self, f64)> {
            let mut candidate = Self::with_rotation(family, rotation).ok()?;
            candidate.fit(data, controls).ok()?;
            let criterion = match controls.selection_criterion() {
                SelectionCriterion::Loglik => candidate.loglik(data).map(|ll| -ll),
                SelectionCriterion::Aic => candidate.aic(data),
                SelectionCriterion::Bic => candidate.bic(data),
                SelectionCriterion::Mbic => candidate.mbic(data, controls.psi0()),
            }
            .ok()?;
            criterion.is_finite().then_some((candidate, criterion))
        };

        // Every candidate is an independent fit; fan them out across threads
        // rather than iterating one-by-one, unless told to stay serial.
        let best = if controls.num_threads() <= 1 {
            candidates.into_iter().filter_map(evaluate).min_by(|(_, a), (_, b)| a.partial_cmp(b).expect("is_finite excludes NaN"))
        } else {
            candidates
                .into_par_iter()
                .filter_map(evaluate)
                .min_by(|(_, a), (_, b)| a.partial_cmp(b).expect("is_finite excludes NaN"))
        };

        best.map(|(bicop, _)| bicop)
            .ok_or_else(|| Error::State("no candidate family could be fit to this data".to_string()))
    }
}

/// `c1 - c2`: the lower-quadrant minus upper-quadrant Pearson correlation of
/// `(x, y)` transformed through the standard normal quantile, zero for a
/// quadrant with fewer than 2 points.
fn tail_scatter_asymmetry(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are always valid");
    let z: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .map(|(&a, &b)| {
            (normal.inverse_cdf(crate::bicop::engine::clip01(a)), normal.inverse_cdf(crate::bicop::engine::clip01(b)))
        })
        .collect();

    let (lower_x, lower_y): (Vec<f64>, Vec<f64>) = z.iter().filter(|(a, b)| *a < 0.0 && *b < 0.0).copied().unzip();
    let (upper_x, upper_y): (Vec<f64>, Vec<f64>) = z.iter().filter(|(a, b)| *a > 0.0 && *b > 0.0).copied().unzip();

    quadrant_cor(&lower_x, &lower_y) - quadrant_cor(&upper_x, &upper_y)
}

fn quadrant_cor(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let cor = pairwise_cor(ArrayView1::from(x), ArrayView1::from(y));
    if cor.is_finite() {
        cor
    } else {
        0.0
    }
}

/// Picks `base[0]` (the un-flipped rotation, `0` or `90`) when the
/// lower-quadrant correlation dominates, `base[1]` (the survival rotation,
/// `180` or `270`) otherwise.
fn preferred_rotation(base: [u16; 2], c1_minus_c2: f64) -> u16 {
    if c1_minus_c2 >= 0.0 {
        base[0]
    } else {
        base[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn rotationless_family_rejects_nonzero_rotation() {
        assert!(Bicop::with_rotation(BicopFamily::Gaussian, 90).is_err());
    }

    #[test]
    fn clayton_rotation_180_matches_the_survival_identity() {
        let bicop = Bicop::with_rotation(BicopFamily::Clayton, 180).unwrap();
        let (u1, u2) = (0.3, 0.6);
        let direct = bicop.cdf(u1, u2);
        let base = Bicop::new(BicopFamily::Clayton);
        let expected = u1 + u2 - 1.0 + base.cdf(1.0 - u1, 1.0 - u2);
        assert!((direct - expected).abs() < 1e-10);
    }

    #[test]
    fn flip_swaps_90_and_270_but_leaves_0_and_180_alone() {
        let mut bicop = Bicop::with_rotation(BicopFamily::Gumbel, 90).unwrap();
        bicop.flip();
        assert_eq!(bicop.rotation(), 270);
        bicop.flip();
        assert_eq!(bicop.rotation(), 90);

        let mut flat = Bicop::with_rotation(BicopFamily::Gumbel, 0).unwrap();
        flat.flip();
        assert_eq!(flat.rotation(), 0);
    }

    #[test]
    fn hinv1_inverts_hfunc1_across_rotations() {
        for &rotation in &ROTATIONS {
            let bicop = Bicop::with_rotation(BicopFamily::Gumbel, rotation).unwrap();
            let (u1, u2) = (0.35, 0.7);
            let q = bicop.hfunc1(u1, u2);
            let back = bicop.hinv1(u1, q);
            assert!((back - u2).abs() < 1e-3, "rotation {rotation}: expected {u2}, got {back}");
        }
    }

    #[test]
    fn simulate_produces_values_in_the_unit_square() {
        let bicop = Bicop::new(BicopFamily::Frank);
        let mut rng = Pcg64::seed_from_u64(42);
        let sample = bicop.simulate(50, &mut rng);
        for row in sample.rows() {
            assert!((0.0..=1.0).contains(&row[0]));
            assert!((0.0..=1.0).contains(&row[1]));
        }
    }

    #[test]
    fn fit_recovers_strong_positive_dependence() {
        let data = array![
            [0.05, 0.07],
            [0.1, 0.12],
            [0.2, 0.18],
            [0.3, 0.33],
            [0.4, 0.37],
            [0.5, 0.52],
            [0.6, 0.58],
            [0.7, 0.74],
            [0.8, 0.79],
            [0.9, 0.88],
        ];
        let mut bicop = Bicop::new(BicopFamily::Gaussian);
        bicop.fit(data.view(), &FitControlsBicop::default()).unwrap();
        assert!(bicop.parameters()[0] > 0.5);
    }

    #[test]
    fn diagnostics_are_unavailable_before_fitting_and_cached_after() {
        let mut bicop = Bicop::new(BicopFamily::Gaussian);
        assert!(bicop.nobs().is_err());
        assert!(bicop.fitted_loglik().is_err());

        let data = array![[0.2, 0.3], [0.5, 0.4], [0.7, 0.8], [0.1, 0.2]];
        bicop.fit(data.view(), &FitControlsBicop::default()).unwrap();
        assert_eq!(bicop.nobs().unwrap(), 4);
        assert!(bicop.fitted_loglik().unwrap().is_finite());
    }

    #[test]
    fn select_prefers_independence_for_unrelated_data() {
        let data = array![
            [0.1, 0.9],
            [0.2, 0.1],
            [0.3, 0.7],
            [0.4, 0.3],
            [0.5, 0.95],
            [0.6, 0.05],
            [0.7, 0.6],
            [0.8, 0.2],
            [0.9, 0.5],
            [0.15, 0.4],
        ];
        let mut controls = FitControlsBicop::default();
        controls.set_family_set(vec![BicopFamily::Indep, BicopFamily::Gaussian, BicopFamily::Clayton]);
        let selected = Bicop::select(data.view(), &controls).unwrap();
        assert!(matches!(selected.family(), BicopFamily::Indep | BicopFamily::Gaussian));
    }

    fn strong_dependence_data() -> Array2<f64> {
        array![
            [0.05, 0.07],
            [0.1, 0.12],
            [0.2, 0.18],
            [0.3, 0.33],
            [0.4, 0.37],
            [0.5, 0.52],
            [0.6, 0.58],
            [0.7, 0.74],
            [0.8, 0.79],
            [0.9, 0.88],
        ]
    }

    #[test]
    fn select_honors_loglik_criterion() {
        let data = strong_dependence_data();
        let mut controls = FitControlsBicop::default();
        controls.set_family_set(vec![BicopFamily::Indep, BicopFamily::Gaussian]);
        controls.set_selection_criterion(SelectionCriterion::Loglik);
        let selected = Bicop::select(data.view(), &controls).unwrap();
        assert_eq!(selected.family(), BicopFamily::Gaussian);
    }

    #[test]
    fn select_honors_mbic_criterion() {
        let data = strong_dependence_data();
        let mut controls = FitControlsBicop::default();
        controls.set_family_set(vec![BicopFamily::Indep, BicopFamily::Gaussian]);
        controls.set_selection_criterion(SelectionCriterion::Mbic);
        controls.set_psi0(0.5).unwrap();
        let selected = Bicop::select(data.view(), &controls).unwrap();
        assert_eq!(selected.family(), BicopFamily::Gaussian);
    }

    #[test]
    fn student_fit_profiles_nu_and_keeps_rho_at_the_tau_seed() {
        let data = strong_dependence_data();
        let tau = pairwise_tau(data.column(0), data.column(1));
        let expected_rho = (std::f64::consts::PI / 2.0 * tau).sin();

        let mut bicop = Bicop::new(BicopFamily::Student);
        bicop.fit(data.view(), &FitControlsBicop::default()).unwrap();
        assert!((bicop.parameters()[0] - expected_rho).abs() < 1e-9);
        assert!(bicop.parameters()[1] > 2.0 && bicop.parameters()[1] <= 50.0);
    }

    #[test]
    fn preselect_families_picks_a_single_rotation_for_asymmetric_families() {
        let data = strong_dependence_data();
        let c1_minus_c2 = tail_scatter_asymmetry(data.column(0), data.column(1));
        let rotation = preferred_rotation([0, 180], c1_minus_c2);
        assert!(rotation == 0 || rotation == 180);
    }

    #[test]
    fn weights_change_the_fitted_parameters() {
        let data = strong_dependence_data();
        let n = data.nrows();

        let mut unweighted = Bicop::new(BicopFamily::Gaussian);
        unweighted.fit(data.view(), &FitControlsBicop::default()).unwrap();

        let mut skewed = vec![0.1; n];
        *skewed.last_mut().unwrap() = 20.0;
        let mut controls = FitControlsBicop::default();
        controls.set_weights(Some(skewed));
        let mut weighted = Bicop::new(BicopFamily::Gaussian);
        weighted.fit(data.view(), &controls).unwrap();

        assert!((unweighted.parameters()[0] - weighted.parameters()[0]).abs() > 1e-6);
    }
}
