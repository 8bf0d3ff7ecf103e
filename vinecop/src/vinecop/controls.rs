//! Controls governing how a whole vine's structure and pair-copulas are
//! selected.

use serde::{Deserialize, Serialize};

use crate::bicop::{FitControlsBicop, ParametricMethod, SelectionCriterion};
use crate::error::{Error, Result};
use crate::family::BicopFamily;
use crate::stats::TreeCriterion;

/// Controls for automatic R-vine structure and pair-copula selection.
///
/// Wraps a [`FitControlsBicop`] (every field there applies per edge) and
/// adds the vine-level concerns: truncation, the tree-selection criterion,
/// edge thresholding, and how many threads fit pair-copulas within a tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitControlsVinecop {
    bicop_controls: FitControlsBicop,
    truncation_level: usize,
    tree_criterion: TreeCriterion,
    threshold: f64,
    select_truncation_level: bool,
    select_threshold: bool,
    show_trace: bool,
    num_threads: usize,
    psi0: f64,
}

impl Default for FitControlsVinecop {
    fn default() -> Self {
        Self {
            bicop_controls: FitControlsBicop::default(),
            truncation_level: usize::MAX,
            tree_criterion: TreeCriterion::Tau,
            threshold: 0.0,
            select_truncation_level: false,
            select_threshold: false,
            show_trace: false,
            num_threads: 1,
            psi0: 0.9,
        }
    }
}

impl FitControlsVinecop {
    /// Builds custom controls on top of an existing [`FitControlsBicop`],
    /// validating `truncation_level`, `threshold`, and `psi0`.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `truncation_level < 1`, `threshold`
    /// is outside `[0, 1]`, or `psi0` is outside `(0, 1)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bicop_controls: FitControlsBicop,
        truncation_level: usize,
        tree_criterion: TreeCriterion,
        threshold: f64,
        select_truncation_level: bool,
        select_threshold: bool,
        show_trace: bool,
        num_threads: usize,
        psi0: f64,
    ) -> Result<Self> {
        check_truncation_level(truncation_level)?;
        check_threshold(threshold)?;
        check_psi0(psi0)?;
        Ok(Self {
            bicop_controls,
            truncation_level,
            tree_criterion,
            threshold,
            select_truncation_level,
            select_threshold,
            show_trace,
            num_threads: process_num_threads(num_threads),
            psi0,
        })
    }

    /// The per-edge pair-copula controls.
    #[must_use]
    pub const fn bicop_controls(&self) -> &FitControlsBicop {
        &self.bicop_controls
    }

    /// The candidate families considered for every edge.
    #[must_use]
    pub fn family_set(&self) -> &[BicopFamily] {
        self.bicop_controls.family_set()
    }

    /// The per-edge parametric estimation method.
    #[must_use]
    pub const fn parametric_method(&self) -> ParametricMethod {
        self.bicop_controls.parametric_method()
    }

    /// The per-edge family-selection criterion.
    #[must_use]
    pub const fn selection_criterion(&self) -> SelectionCriterion {
        self.bicop_controls.selection_criterion()
    }

    /// Maximum tree depth; `usize::MAX` means "untruncated".
    #[must_use]
    pub const fn truncation_level(&self) -> usize {
        self.truncation_level
    }

    /// Sets the truncation level.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `truncation_level < 1`.
    pub fn set_truncation_level(&mut self, truncation_level: usize) -> Result<()> {
        check_truncation_level(truncation_level)?;
        self.truncation_level = truncation_level;
        Ok(())
    }

    /// The maximum-spanning-tree edge-weight criterion.
    #[must_use]
    pub const fn tree_criterion(&self) -> TreeCriterion {
        self.tree_criterion
    }

    /// Sets the tree-selection criterion.
    pub fn set_tree_criterion(&mut self, tree_criterion: TreeCriterion) {
        self.tree_criterion = tree_criterion;
    }

    /// Edge-weight threshold below which an edge is dropped (independence).
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sets the threshold.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `threshold` is outside `[0, 1]`.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        check_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Whether the truncation level is chosen automatically (via
    /// log-likelihood stabilization) rather than fixed.
    #[must_use]
    pub const fn select_truncation_level(&self) -> bool {
        self.select_truncation_level
    }

    /// Sets whether the truncation level is chosen automatically.
    pub fn set_select_truncation_level(&mut self, select: bool) {
        self.select_truncation_level = select;
    }

    /// Whether the threshold is chosen automatically.
    #[must_use]
    pub const fn select_threshold(&self) -> bool {
        self.select_threshold
    }

    /// Sets whether the threshold is chosen automatically.
    pub fn set_select_threshold(&mut self, select: bool) {
        self.select_threshold = select;
    }

    /// Whether either sparse-selection knob is active.
    #[must_use]
    pub const fn needs_sparse_select(&self) -> bool {
        self.select_truncation_level || self.select_threshold
    }

    /// Whether to print a trace of the tree-building progress.
    #[must_use]
    pub const fn show_trace(&self) -> bool {
        self.show_trace
    }

    /// Sets whether to print a trace of the tree-building progress.
    pub fn set_show_trace(&mut self, show_trace: bool) {
        self.show_trace = show_trace;
    }

    /// Number of threads used to fit pair-copulas within a tree.
    #[must_use]
    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Sets the thread count, clamped to `[1, available_parallelism()]`.
    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = process_num_threads(num_threads);
    }

    /// The mBICV independence prior `psi0` (vinecopulib's `pi`), passed to
    /// [`Vinecop::mbicv`] when [`Self::select_truncation_level`] drives the
    /// post-hoc truncation search.
    ///
    /// [`Vinecop::mbicv`]: crate::vinecop::Vinecop::mbicv
    #[must_use]
    pub const fn psi0(&self) -> f64 {
        self.psi0
    }

    /// Sets the mBICV independence prior.
    ///
    /// # Errors
    /// Returns [`Error::Parameter`] if `psi0` is outside `(0, 1)`.
    pub fn set_psi0(&mut self, psi0: f64) -> Result<()> {
        check_psi0(psi0)?;
        self.psi0 = psi0;
        Ok(())
    }

    /// Clones these controls with `truncation_level` raised to `usize::MAX`,
    /// used internally to fit the full tree sequence before searching for
    /// the mBICV-optimal truncation depth.
    #[must_use]
    pub(crate) fn untruncated(&self) -> Self {
        let mut clone = self.clone();
        clone.truncation_level = usize::MAX;
        clone
    }
}

fn check_truncation_level(truncation_level: usize) -> Result<()> {
    if truncation_level < 1 {
        return Err(Error::Parameter("truncation_level must be at least 1".to_string()));
    }
    Ok(())
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::Parameter("threshold must be in [0, 1]".to_string()));
    }
    Ok(())
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
    fn default_controls_are_untruncated_and_single_threaded() {
        let controls = FitControlsVinecop::default();
        assert_eq!(controls.truncation_level(), usize::MAX);
        assert_eq!(controls.num_threads(), 1);
        assert!(!controls.needs_sparse_select());
    }

    #[test]
    fn rejects_truncation_level_below_one() {
        let result = FitControlsVinecop::new(
            FitControlsBicop::default(),
            0,
            TreeCriterion::Tau,
            0.0,
            false,
            false,
            false,
            1,
            0.9,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let result = FitControlsVinecop::new(
            FitControlsBicop::default(),
            1,
            TreeCriterion::Tau,
            1.5,
            false,
            false,
            false,
            1,
            0.9,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_psi0_outside_unit_interval() {
        let result =
            FitControlsVinecop::new(FitControlsBicop::default(), 1, TreeCriterion::Tau, 0.0, false, false, false, 1, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn num_threads_is_clamped_to_at_least_one() {
        let controls = FitControlsVinecop::new(
            FitControlsBicop::default(),
            1,
            TreeCriterion::Tau,
            0.0,
            false,
            false,
            false,
            0,
            0.9,
        )
        .unwrap();
        assert!(controls.num_threads() >= 1);
    }
}
