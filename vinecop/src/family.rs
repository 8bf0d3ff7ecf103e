//! The closed catalog of bivariate copula families and their membership sets.

use serde::{Deserialize, Serialize};

/// A variable's measurement scale.
///
/// Only [`VarType::Continuous`] is currently constructible anywhere in this
/// crate; [`VarType::Discrete`] exists for forward compatibility with the
/// named-node serialization format and is otherwise unreachable until
/// discrete-margin semantics are specified.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum VarType {
    /// Continuous margin on `[0, 1]` (the only scale this crate fits).
    Continuous,
    /// Discrete margin; not yet supported.
    Discrete,
}

/// A bivariate copula family identifier.
///
/// WARNING: never reorder these variants, only append — `Bicop` serialization
/// and `enum_dispatch` call sites depend on a stable discriminant order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BicopFamily {
    /// Independence copula: `C(u, v) = u * v`.
    Indep,
    /// Gaussian (elliptical) copula.
    Gaussian,
    /// Student t (elliptical) copula.
    Student,
    /// Clayton (one-parameter Archimedean, lower-tail dependence).
    Clayton,
    /// Gumbel (one-parameter Archimedean, upper-tail dependence).
    Gumbel,
    /// Frank (one-parameter Archimedean, no tail dependence).
    Frank,
    /// Joe (one-parameter Archimedean, upper-tail dependence).
    Joe,
    /// BB1 (two-parameter Archimedean).
    Bb1,
    /// BB6 (two-parameter Archimedean).
    Bb6,
    /// BB7 (two-parameter Archimedean).
    Bb7,
    /// BB8 (two-parameter Archimedean).
    Bb8,
    /// Nonparametric transformed-kernel family.
    Tll0,
}

impl BicopFamily {
    /// All twelve families.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Indep,
            Self::Gaussian,
            Self::Student,
            Self::Clayton,
            Self::Gumbel,
            Self::Frank,
            Self::Joe,
            Self::Bb1,
            Self::Bb6,
            Self::Bb7,
            Self::Bb8,
            Self::Tll0,
        ]
    }

    /// Families with a closed-form or iteratively fitted parameter vector
    /// (everything but the nonparametric family).
    #[must_use]
    pub const fn parametric() -> &'static [Self] {
        &[
            Self::Indep,
            Self::Gaussian,
            Self::Student,
            Self::Clayton,
            Self::Gumbel,
            Self::Frank,
            Self::Joe,
            Self::Bb1,
            Self::Bb6,
            Self::Bb7,
            Self::Bb8,
        ]
    }

    /// Families without a finite-dimensional parameter vector.
    #[must_use]
    pub const fn nonparametric() -> &'static [Self] {
        &[Self::Tll0]
    }

    /// Archimedean families with a single parameter.
    #[must_use]
    pub const fn one_par() -> &'static [Self] {
        &[Self::Gaussian, Self::Clayton, Self::Gumbel, Self::Frank, Self::Joe]
    }

    /// Families with two parameters.
    #[must_use]
    pub const fn two_par() -> &'static [Self] {
        &[Self::Student, Self::Bb1, Self::Bb6, Self::Bb7, Self::Bb8]
    }

    /// Elliptical families.
    #[must_use]
    pub const fn elliptical() -> &'static [Self] {
        &[Self::Gaussian, Self::Student]
    }

    /// Archimedean families.
    #[must_use]
    pub const fn archimedean() -> &'static [Self] {
        &[
            Self::Clayton,
            Self::Gumbel,
            Self::Frank,
            Self::Joe,
            Self::Bb1,
            Self::Bb6,
            Self::Bb7,
            Self::Bb8,
        ]
    }

    /// The two-parameter Archimedean "BB" families.
    #[must_use]
    pub const fn bb() -> &'static [Self] {
        &[Self::Bb1, Self::Bb6, Self::Bb7, Self::Bb8]
    }

    /// Families that never use a rotation other than 0 (symmetric or
    /// already reversible through their own parameterization).
    #[must_use]
    pub const fn rotationless() -> &'static [Self] {
        &[Self::Indep, Self::Gaussian, Self::Student, Self::Frank, Self::Tll0]
    }

    /// Families with lower-tail dependence at rotation 0.
    #[must_use]
    pub const fn lt() -> &'static [Self] {
        &[Self::Clayton, Self::Bb1, Self::Bb7]
    }

    /// Families with upper-tail dependence at rotation 0.
    #[must_use]
    pub const fn ut() -> &'static [Self] {
        &[Self::Gumbel, Self::Joe, Self::Bb1, Self::Bb6, Self::Bb7, Self::Bb8]
    }

    /// Families for which `tau_to_parameters` admits a well-defined inverse
    /// usable to seed an MLE fit from an empirical Kendall's tau.
    #[must_use]
    pub const fn itau() -> &'static [Self] {
        &[
            Self::Indep,
            Self::Gaussian,
            Self::Student,
            Self::Clayton,
            Self::Gumbel,
            Self::Frank,
            Self::Joe,
        ]
    }

    /// Families whose asymmetric tail behavior is realized via rotation
    /// rather than a signed parameter; a "flip" of these is a rotation
    /// change (90 <-> 270) instead of a re-parameterization.
    #[must_use]
    pub const fn flip_by_rotation() -> &'static [Self] {
        &[
            Self::Clayton,
            Self::Gumbel,
            Self::Frank,
            Self::Joe,
            Self::Bb1,
            Self::Bb6,
            Self::Bb7,
            Self::Bb8,
        ]
    }

    /// Short, stable, lowercase name used in serialization and CLI output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Indep => "indep",
            Self::Gaussian => "gaussian",
            Self::Student => "student",
            Self::Clayton => "clayton",
            Self::Gumbel => "gumbel",
            Self::Frank => "frank",
            Self::Joe => "joe",
            Self::Bb1 => "bb1",
            Self::Bb6 => "bb6",
            Self::Bb7 => "bb7",
            Self::Bb8 => "bb8",
            Self::Tll0 => "tll0",
        }
    }

    /// Number of free parameters at rotation 0 (0 for the nonparametric
    /// family, which instead reports an effective parameter count from its
    /// fitted grid).
    #[must_use]
    pub const fn n_parameters(self) -> usize {
        match self {
            Self::Indep | Self::Tll0 => 0,
            Self::Gaussian | Self::Clayton | Self::Gumbel | Self::Frank | Self::Joe => 1,
            Self::Student | Self::Bb1 | Self::Bb6 | Self::Bb7 | Self::Bb8 => 2,
        }
    }
}

impl std::fmt::Display for BicopFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BicopFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|family| family.name() == s)
            .ok_or_else(|| crate::Error::Parameter(format!("unknown family `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_twelve_families() {
        assert_eq!(BicopFamily::all().len(), 12);
    }

    #[test]
    fn name_round_trips_through_from_str() {
        for family in BicopFamily::all() {
            let parsed: BicopFamily = family.name().parse().unwrap();
            assert_eq!(parsed, *family);
        }
    }

    #[test]
    fn unknown_name_is_a_parameter_error() {
        assert!(matches!("nope".parse::<BicopFamily>(), Err(crate::Error::Parameter(_))));
    }
}
