//! Joint parameter vectors of decorator models.
//!
//! A decorator with a calibratable own block exposes
//! `inner.parameters() ++ own` and splits incoming vectors at `len - k`.
//! Without a calibratable block the inner parameters pass through unchanged.
//! Both directions depend only on vector lengths and the flag.

use pricer_core::types::{ModelError, ParameterVector};

/// Joint parameter vector of a decorator.
///
/// # Examples
///
/// ```
/// use pricer_core::types::ParameterVector;
/// use pricer_models::models::covariance::{join_parameters, split_parameters};
///
/// let inner = ParameterVector::from_scalars(&[0.2, 0.1]);
/// let own = ParameterVector::from_scalars(&[0.03]);
///
/// let joint = join_parameters(&inner, &own, true);
/// assert_eq!(joint.to_scalars(), vec![0.2, 0.1, 0.03]);
///
/// let (head, tail) = split_parameters(&joint, 1, true).unwrap();
/// assert_eq!(head, inner);
/// assert_eq!(tail, Some(own.clone()));
///
/// assert_eq!(join_parameters(&inner, &own, false), inner);
/// ```
pub fn join_parameters(
    inner: &ParameterVector,
    own: &ParameterVector,
    own_calibratable: bool,
) -> ParameterVector {
    if own_calibratable {
        inner.concat(own)
    } else {
        inner.clone()
    }
}

/// Split a joint vector into the inner model's part and the own block.
///
/// Returns `None` for the own block when it is not calibratable.
///
/// # Errors
///
/// [`ModelError::ParameterCount`] if the vector is shorter than `own_len`.
pub fn split_parameters(
    joint: &ParameterVector,
    own_len: usize,
    own_calibratable: bool,
) -> Result<(ParameterVector, Option<ParameterVector>), ModelError> {
    if !own_calibratable {
        return Ok((joint.clone(), None));
    }
    let (inner, own) = joint.split_tail(own_len)?;
    Ok((inner, Some(own)))
}
