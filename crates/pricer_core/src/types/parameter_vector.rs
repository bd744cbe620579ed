//! Ordered parameter vectors exchanged between models and the optimizer.

use std::ops::Index;

use super::error::ModelError;
use super::random_variable::RandomVariable;

/// Immutable, ordered sequence of (possibly stochastic) parameter values.
///
/// Decorators append their own block at the end of the inner model's
/// parameters, so [`concat`](Self::concat) and
/// [`split_tail`](Self::split_tail) are the only marshaling primitives
/// needed.
///
/// # Examples
///
/// ```
/// use pricer_core::types::ParameterVector;
///
/// let inner = ParameterVector::from_scalars(&[0.1, 0.2]);
/// let own = ParameterVector::from_scalars(&[0.03]);
/// let joint = inner.concat(&own);
/// assert_eq!(joint.to_scalars(), vec![0.1, 0.2, 0.03]);
///
/// let (head, tail) = joint.split_tail(1).unwrap();
/// assert_eq!(head, inner);
/// assert_eq!(tail, own);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterVector {
    values: Vec<RandomVariable>,
}

impl ParameterVector {
    /// Empty vector, used by models that are not calibratable.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap existing values.
    #[inline]
    pub fn new(values: Vec<RandomVariable>) -> Self {
        Self { values }
    }

    /// Deterministic entries from scalars.
    pub fn from_scalars(values: &[f64]) -> Self {
        Self {
            values: values.iter().map(|&v| RandomVariable::constant(v)).collect(),
        }
    }

    /// Path averages of all entries.
    pub fn to_scalars(&self) -> Vec<f64> {
        self.values.iter().map(RandomVariable::average).collect()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entry at index `i`, if any.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&RandomVariable> {
        self.values.get(i)
    }

    /// All entries.
    #[inline]
    pub fn as_slice(&self) -> &[RandomVariable] {
        &self.values
    }

    /// New vector with `other` appended after `self`.
    pub fn concat(&self, other: &ParameterVector) -> ParameterVector {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        ParameterVector { values }
    }

    /// Split into the leading `len - k` entries and the trailing `k`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ParameterCount`] if `k > len`.
    pub fn split_tail(&self, k: usize) -> Result<(ParameterVector, ParameterVector), ModelError> {
        if k > self.len() {
            return Err(ModelError::ParameterCount {
                expected: k,
                got: self.len(),
            });
        }
        let (head, tail) = self.values.split_at(self.len() - k);
        Ok((ParameterVector::new(head.to_vec()), ParameterVector::new(tail.to_vec())))
    }
}

impl Index<usize> for ParameterVector {
    type Output = RandomVariable;

    fn index(&self, i: usize) -> &RandomVariable {
        &self.values[i]
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        ParameterVector::from_scalars(&values)
    }
}

impl FromIterator<RandomVariable> for ParameterVector {
    fn from_iter<I: IntoIterator<Item = RandomVariable>>(iter: I) -> Self {
        ParameterVector {
            values: iter.into_iter().collect(),
        }
    }
}
