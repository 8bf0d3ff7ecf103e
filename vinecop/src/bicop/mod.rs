//! Bivariate pair-copula families: a shared engine contract
//! ([`engine::BicopEngine`]), one module per family, and the rotation-aware
//! facade ([`facade::Bicop`]) that ties them together.

pub mod bb1;
pub mod bb6;
pub mod bb7;
pub mod bb8;
pub mod clayton;
pub mod controls;
pub mod engine;
pub mod facade;
pub mod frank;
pub mod gaussian;
pub mod gumbel;
pub mod indep;
pub mod joe;
pub mod kernel;
pub mod student;

pub use controls::{FitControlsBicop, ParametricMethod, SelectionCriterion};
pub use engine::BicopEngine;
pub use facade::Bicop;
