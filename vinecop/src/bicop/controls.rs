//! Controls governing how a single pair-copula is fit and selected.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::family::BicopFamily;

/// How the parameters of a parametric family are estimated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ParametricMethod {
    /// Full maximum likelihood over the whole parameter vector.
    Mle,
    /// Invert Kendall's tau for one-parameter families; falls back to MLE
    /// for families with no unique tau inverse.
    Itau,
}

/// The criterion used to rank candidate families during selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SelectionCriterion {
    /// Raw log-likelihood (maximized, i.e. ranked by `-loglik`).
    Loglik,
    /// Akaike information criterion.
    Aic,
    /// Bayesian information criterion.
    Bic,
    /// Modified BIC with an independence prior `psi0` (see [`Bicop::mbic`]).
    ///
    /// [`Bicop::mbic`]: crate::bicop::Bicop::mbic
    Mbic,
}

/// Controls for fitting and selecting a single pair-copula.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitControlsBicop {
    family_set: Vec<BicopFamily>,
    parametric_method: ParametricMethod,
    nonparametric_mult: f64,
    selection_criterion: SelectionCriterion,
    preselect_families: bool,
    psi0: f64,
    weights: Option<Vec<f64>>,
    num_threads: usize,
}

impl Default for FitControlsBicop {
    fn default() -> Self {
        Self {
            family_set: BicopFamily::all().to_vec(),
            parametric_method: ParametricMethod::Mle,
            nonparametric_mult: 1.0,
            selection_criterion: SelectionCriterion::Bic,
            preselect_families: true,
            psi0: 0.9,
            weights: None,
            num_threads: 1,
        }
    }
}

impl FitControlsBicop {
    /// Builds custom controls, validating `nonparametric_mult` and `psi0`.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `nonparametric_mult` is not positive,
    /// or if `psi0` is outside `(0, 1)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family_set: Vec<BicopFamily>,
        parametric_method: ParametricMethod,
        nonparametric_mult: f64,
        selection_criterion: SelectionCriterion,
        preselect_families: bool,
        psi0: f64,
        weights: Option<Vec<f64>>,
        num_threads: usize,
    ) -> Result<Self> {
        if !(nonparametric_mult > 0.0) {
            return Err(Error::Parameter("nonparametric_mult must be positive".to_string()));
        }
        check_psi0(psi0)?;
        Ok(Self {
            family_set,
            parametric_method,
            nonparametric_mult,
            selection_criterion,
            preselect_families,
            psi0,
            weights,
            num_threads: process_num_threads(num_threads),
        })
    }

    /// The candidate families considered during selection.
    #[must_use]
    pub fn family_set(&self) -> &[BicopFamily] {
        &self.family_set
    }

    /// Sets the candidate family set.
    pub fn set_family_set(&mut self, family_set: Vec<BicopFamily>) {
        self.family_set = family_set;
    }

    /// The parametric estimation method.
    #[must_use]
    pub const fn parametric_method(&self) -> ParametricMethod {
        self.parametric_method
    }

    /// Sets the parametric estimation method.
    pub fn set_parametric_method(&mut self, method: ParametricMethod) {
        self.parametric_method = method;
    }

    /// The bandwidth multiplier applied on top of the plug-in rule for the
    /// nonparametric family.
    #[must_use]
    pub const fn nonparametric_mult(&self) -> f64 {
        self.nonparametric_mult
    }

    /// The selection criterion.
    #[must_use]
    pub const fn selection_criterion(&self) -> SelectionCriterion {
        self.selection_criterion
    }

    /// Sets the selection criterion.
    pub fn set_selection_criterion(&mut self, criterion: SelectionCriterion) {
        self.selection_criterion = criterion;
    }

    /// Whether families are preselected based on summary statistics before
    /// fitting every rotation.
    #[must_use]
    pub const fn preselect_families(&self) -> bool {
        self.preselect_families
    }

    /// Sets whether families are preselected.
    pub fn set_preselect_families(&mut self, preselect: bool) {
        self.preselect_families = preselect;
    }

    /// The independence prior mass used by [`SelectionCriterion::Mbic`]
    /// (and by [`Bicop::mbic`] when called directly).
    ///
    /// [`Bicop::mbic`]: crate::bicop::Bicop::mbic
    #[must_use]
    pub const fn psi0(&self) -> f64 {
        self.psi0
    }

    /// Sets the independence prior mass.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `psi0` is outside `(0, 1)`.
    pub fn set_psi0(&mut self, psi0: f64) -> Result<()> {
        check_psi0(psi0)?;
        self.psi0 = psi0;
        Ok(())
    }

    /// Optional per-observation weights used to scale each observation's
    /// log-likelihood contribution during [`ParametricMethod::Mle`] fitting.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Sets the per-observation weights (or clears them, with `None`).
    pub fn set_weights(&mut self, weights: Option<Vec<f64>>) {
        self.weights = weights;
    }

    /// Number of threads used to fan out candidate fits during [`Bicop::select`].
    ///
    /// [`Bicop::select`]: crate::bicop::Bicop::select
    #[must_use]
    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Sets the thread count, clamped to `[1, available_parallelism()]`.
    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = process_num_threads(num_threads);
    }
}

fn check_psi0(psi0: f64) -> Result<()> {
    if !(psi0 > 0.0 && psi0 < 1.0) {
        return Err(Error::Parameter("psi0 must be in (0, 1)".to_string()));
    }
    Ok(())
}

fn process_num_threads(num_threads: usize) -> usize {
    let max_threads = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    num_threads.max(1).min(max_threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_controls_use_all_families_and_bic() {
        let controls = FitControlsBicop::default();
        assert_eq!(controls.family_set().len(), BicopFamily::all().len());
        assert_eq!(controls.selection_criterion(), SelectionCriterion::Bic);
        assert!((controls.psi0() - 0.9).abs() < 1e-12);
        assert!(controls.weights().is_none());
    }

    #[test]
    fn rejects_nonpositive_nonparametric_mult() {
        let result = FitControlsBicop::new(
            BicopFamily::all().to_vec(),
            ParametricMethod::Mle,
            0.0,
            SelectionCriterion::Bic,
            true,
            0.9,
            None,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_psi0_outside_unit_interval() {
        let result = FitControlsBicop::new(
            BicopFamily::all().to_vec(),
            ParametricMethod::Mle,
            1.0,
            SelectionCriterion::Mbic,
            true,
            1.0,
            None,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn num_threads_is_clamped_to_at_least_one() {
        let mut controls = FitControlsBicop::default();
        controls.set_num_threads(0);
        assert!(controls.num_threads() >= 1);
    }
}
