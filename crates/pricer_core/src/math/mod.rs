//! Numerical routines.
//!
//! - [`solvers`]: bounded Levenberg-Marquardt least-squares solver and the
//!   smooth parameter transforms it relies on

pub mod solvers;
