//! Forward rates implied by discount factors.

use super::flat::FlatCurve;
use super::traits::{check_forward_arguments, ForwardCurve, YieldCurve};
use crate::market_data::error::MarketDataError;

/// Simple forward implied by a yield curve:
///
/// ```text
/// F(t, Δ) = (D(t) / D(t + Δ) - 1) / Δ
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountForwardCurve<C> {
    curve: C,
}

impl<C: YieldCurve<f64>> DiscountForwardCurve<C> {
    /// Wrap a yield curve.
    pub fn new(curve: C) -> Self {
        Self { curve }
    }

    /// Underlying yield curve.
    pub fn curve(&self) -> &C {
        &self.curve
    }
}

impl DiscountForwardCurve<FlatCurve<f64>> {
    /// Forwards implied by a flat continuously compounded rate.
    pub fn flat(rate: f64) -> Self {
        Self::new(FlatCurve::new(rate))
    }
}

impl<C: YieldCurve<f64>> ForwardCurve for DiscountForwardCurve<C> {
    fn forward(&self, fixing_time: f64, period_length: f64) -> Result<f64, MarketDataError> {
        check_forward_arguments(fixing_time, period_length)?;
        let df_start = self.curve.discount_factor(fixing_time)?;
        let df_end = self.curve.discount_factor(fixing_time + period_length)?;
        Ok((df_start / df_end - 1.0) / period_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_rate_forward_is_time_homogeneous() {
        let curve = DiscountForwardCurve::flat(0.04);
        let f1 = curve.forward(0.0, 0.25).unwrap();
        let f2 = curve.forward(5.0, 0.25).unwrap();
        assert_relative_eq!(f1, f2, epsilon = 1e-14);
        assert_relative_eq!(f1, ((0.04_f64 * 0.25).exp() - 1.0) / 0.25, epsilon = 1e-14);
    }

    #[test]
    fn test_simple_forward_exceeds_continuous_rate() {
        let curve = DiscountForwardCurve::flat(0.05);
        assert!(curve.forward(1.0, 1.0).unwrap() > 0.05);
    }

    #[test]
    fn test_negative_fixing_rejected() {
        let curve = DiscountForwardCurve::flat(0.05);
        assert!(matches!(
            curve.forward(-1.0, 0.5),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }
}
