//! Flat curves.

use super::traits::{check_forward_arguments, ForwardCurve, YieldCurve};
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Flat yield curve with constant continuously compounded rate.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
///
/// let curve = FlatCurve::new(0.05_f64);
/// assert_eq!(curve.rate(), 0.05);
/// assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCurve<T: Float> {
    rate: T,
}

impl<T: Float> FlatCurve<T> {
    /// Construct a flat curve with the given constant rate.
    #[inline]
    pub fn new(rate: T) -> Self {
        Self { rate }
    }

    /// Return the constant rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }
}

impl<T: Float> YieldCurve<T> for FlatCurve<T> {
    #[inline]
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok((-self.rate * t).exp())
    }
}

/// Forward curve returning the same forward for every fixing and period.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatForwardCurve, ForwardCurve};
///
/// let curve = FlatForwardCurve::new(0.03);
/// assert_eq!(curve.forward(2.0, 0.5).unwrap(), 0.03);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForwardCurve {
    forward: f64,
}

impl FlatForwardCurve {
    /// Construct a flat forward curve.
    #[inline]
    pub fn new(forward: f64) -> Self {
        Self { forward }
    }
}

impl ForwardCurve for FlatForwardCurve {
    fn forward(&self, fixing_time: f64, period_length: f64) -> Result<f64, MarketDataError> {
        check_forward_arguments(fixing_time, period_length)?;
        Ok(self.forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_discount_factor() {
        let curve = FlatCurve::new(0.05_f64);
        assert_relative_eq!(curve.discount_factor(2.0).unwrap(), (-0.1_f64).exp());
        assert!(curve.discount_factor(-1.0).is_err());
    }

    #[test]
    fn test_flat_forward_rejects_bad_period() {
        let curve = FlatForwardCurve::new(0.03);
        assert!(curve.forward(1.0, -0.5).is_err());
    }
}
