//! Yield and forward curve traits.

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Generic yield curve trait for discount factor and rate calculations.
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 for all t >= 0
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
///
/// let curve = FlatCurve::new(0.05_f64);
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
/// assert!((curve.zero_rate(1.0).unwrap() - 0.05).abs() < 1e-12);
/// ```
pub trait YieldCurve<T: Float> {
    /// Return the discount factor for maturity `t`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::InvalidMaturity` if `t < 0`.
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError>;

    /// Continuously compounded zero rate, `r(t) = -ln(D(t)) / t`.
    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        let df = self.discount_factor(t)?;
        if t <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok(-df.ln() / t)
    }
}

/// Simple (money-market) forward rates.
///
/// Object safe so that models can hold a shared `Arc<dyn ForwardCurve + Send + Sync>`.
pub trait ForwardCurve {
    /// Forward rate fixing at `fixing_time` for a period of `period_length`.
    ///
    /// # Errors
    ///
    /// - `MarketDataError::InvalidMaturity` if `fixing_time < 0`
    /// - `MarketDataError::InvalidPeriod` if `period_length <= 0`
    fn forward(&self, fixing_time: f64, period_length: f64) -> Result<f64, MarketDataError>;
}

/// Shared argument checks for [`ForwardCurve::forward`] implementations.
pub(crate) fn check_forward_arguments(
    fixing_time: f64,
    period_length: f64,
) -> Result<(), MarketDataError> {
    if fixing_time.is_nan() || fixing_time < 0.0 {
        return Err(MarketDataError::InvalidMaturity { t: fixing_time });
    }
    if period_length.is_nan() || period_length <= 0.0 {
        return Err(MarketDataError::InvalidPeriod {
            length: period_length,
        });
    }
    Ok(())
}
