use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
///
/// Variants mirror the taxonomy a caller needs to react to: domain/parameter
/// problems are the caller's fault and should not be retried as-is;
/// `Numeric` and `Cancelled` may be retried with different settings.
#[derive(Debug, Error)]
pub enum Error {
    /// Input outside the unit cube, wrong dimensions, or non-positive `n`.
    #[error("{0}")]
    Domain(String),
    /// Parameter vector size/bounds mismatch, invalid rotation, unknown
    /// family/criterion/method string.
    #[error("{0}")]
    Parameter(String),
    /// R-vine matrix fails an axiom, or a pair-copula staircase shape is
    /// inconsistent with the matrix dimension.
    #[error("{0}")]
    Structure(String),
    /// A diagnostic (log-likelihood, observation count) was requested on an
    /// object never fitted to data.
    #[error("{0}")]
    State(String),
    /// Optimizer or quadrature failure.
    #[error("{0}")]
    Numeric(String),
    /// Raised by the user-interrupt hook.
    #[error("operation cancelled by interrupt hook")]
    Cancelled,
    /// Any other error, wrapped opaquely.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
