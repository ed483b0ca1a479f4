//! Certainty values with range validation.
//!
//! Every perception model reports a self-assessed certainty on a 0–100
//! scale. The type guarantees the range invariant at construction so the
//! rest of the pipeline never has to re-check it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated certainty score in `[0.0, 100.0]`.
///
/// Certainty is reported by each perception model and combined across
/// sources with [`Certainty::min_of`]: a fused ruling can never be more
/// certain than its weakest supporting signal.
///
/// # Examples
///
/// ```
/// use varcore::Certainty;
///
/// let c = Certainty::new(92.5).unwrap();
/// assert_eq!(c.value(), 92.5);
/// assert!(Certainty::new(150.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certainty(f32);

impl Certainty {
    /// Minimum valid certainty value.
    pub const MIN_VALUE: f32 = 0.0;

    /// Maximum valid certainty value.
    pub const MAX_VALUE: f32 = 100.0;

    /// Creates a new certainty with validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::CertaintyOutOfRange` if the value is NaN
    /// or not in `[0.0, 100.0]`.
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if value.is_nan() || !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            return Err(ValidationError::CertaintyOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates a zero certainty (complete uncertainty).
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a full certainty (complete confidence).
    #[must_use]
    pub const fn full() -> Self {
        Self(100.0)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Combines two certainties conservatively: the weaker one wins.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// The minimum over a non-empty set of certainties.
    ///
    /// Returns [`Certainty::zero`] for an empty iterator; the fusion engine
    /// never passes one, but an empty set is maximally uncertain anyway.
    #[must_use]
    pub fn min_of(values: impl IntoIterator<Item = Self>) -> Self {
        values
            .into_iter()
            .reduce(Self::min)
            .unwrap_or_else(Self::zero)
    }
}

impl fmt::Display for Certainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}
