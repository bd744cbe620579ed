//! Curve abstractions for forward-rate lookups.
//!
//! This module provides:
//! - [`YieldCurve`]: Generic trait for discount factor and rate calculations
//! - [`ForwardCurve`]: Simple forward rate for a fixing time and period length
//! - [`FlatCurve`]: Constant rate yield curve implementation
//! - [`FlatForwardCurve`]: Constant forward curve
//! - [`DiscountForwardCurve`]: Forwards implied by a yield curve's discount factors

mod discount;
mod flat;
mod traits;

pub use discount::DiscountForwardCurve;
pub use flat::{FlatCurve, FlatForwardCurve};
pub use traits::{ForwardCurve, YieldCurve};
