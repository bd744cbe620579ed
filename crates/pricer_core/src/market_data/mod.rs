//! Market data consumed by covariance models.
//!
//! Only forward-rate lookups are needed here: the blended covariance model
//! evaluates its reference level on a [`ForwardCurve`].
//!
//! # Components
//!
//! - [`curves`]: Yield and forward curve traits with flat and
//!   discount-implied implementations
//! - [`error`]: Market data error types (MarketDataError)
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{DiscountForwardCurve, ForwardCurve};
//!
//! let curve = DiscountForwardCurve::flat(0.02);
//! let fwd = curve.forward(1.0, 0.5).unwrap();
//! assert!((fwd - ((0.02_f64 * 0.5).exp() - 1.0) / 0.5).abs() < 1e-14);
//! ```

pub mod curves;
pub mod error;

pub use curves::{DiscountForwardCurve, FlatCurve, FlatForwardCurve, ForwardCurve, YieldCurve};
pub use error::MarketDataError;
