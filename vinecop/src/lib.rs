#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! Estimation, evaluation, and simulation of regular vine copulas.
//!
//! A vine copula decomposes a `d`-variate copula into a cascade of bivariate
//! "pair copulas" organized on a sequence of nested trees (an R-vine). This
//! crate provides the bivariate copula catalog ([`bicop`]), the R-vine
//! structure abstraction ([`rvine_matrix`]), the cascade evaluator and
//! automatic structure selection ([`vinecop`]), and the numerical helpers
//! they all build on.

pub mod bicop;
pub mod error;
pub mod family;
pub mod interp_grid;
pub mod node;
pub mod optim;
pub mod quadrature;
pub mod rvine_matrix;
pub mod stats;
pub mod vinecop;

pub use bicop::facade::Bicop;
pub use error::{Error, Result};
pub use family::BicopFamily;
pub use node::Node;
pub use rvine_matrix::RVineMatrix;
pub use vinecop::Vinecop;
