//! Pipeline configuration.
//!
//! All tunable thresholds live in one struct passed to the core at
//! construction, instead of constants scattered across modules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What fusion does when a source signals non-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Substitute the fallback model's estimate as a lowest-confidence
    /// contribution and fuse anyway.
    Substitute,

    /// Defer the frame: fusion waits for the source to re-submit.
    Defer,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::Substitute
    }
}

/// Core pipeline configuration.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Rulings with fused confidence below this are escalated for human
    /// review. Percent scale, `[0.0, 100.0]`.
    pub review_threshold: f32,

    /// Non-detection handling.
    pub fallback_policy: FallbackPolicy,

    /// Per-target delivery deadline for the publisher.
    pub delivery_timeout: Duration,
}

impl CoreConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ThresholdOutOfRange` if the review
    /// threshold is NaN or outside `[0.0, 100.0]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let t = self.review_threshold;
        if t.is_nan() || !(0.0..=100.0).contains(&t) {
            return Err(ValidationError::ThresholdOutOfRange { value: t });
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            review_threshold: 95.0,
            fallback_policy: FallbackPolicy::default(),
            delivery_timeout: Duration::from_secs(2),
        }
    }
}
