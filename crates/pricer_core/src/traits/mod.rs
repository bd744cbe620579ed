//! Core traits and descriptors shared by the calibration layers.
//!
//! - [`calibration::ParameterBounds`]: admissible range of a model parameter

pub mod calibration;

pub use calibration::{split_bounds, ParameterBounds};
