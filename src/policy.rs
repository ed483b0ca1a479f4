//! Policy gate: decides whether a fused ruling is final or escalates.

use tracing::debug;

use crate::ruling::Ruling;

/// Stamps the review flag on fused rulings.
///
/// Evaluation is pure and idempotent: the same ruling in always produces
/// the same ruling out. Escalated rulings are still recorded so the
/// reviewer has a concrete proposal to confirm or reject.
#[derive(Debug, Clone, Copy)]
pub struct PolicyGate {
    review_threshold: f32,
}

impl PolicyGate {
    /// Creates a gate with the given review threshold (percent scale).
    ///
    /// The threshold is validated by [`CoreConfig`](crate::config::CoreConfig)
    /// before it reaches the gate.
    #[must_use]
    pub const fn new(review_threshold: f32) -> Self {
        Self { review_threshold }
    }

    /// The configured threshold.
    #[must_use]
    pub const fn review_threshold(&self) -> f32 {
        self.review_threshold
    }

    /// Evaluates a ruling, setting `requires_review`.
    #[must_use]
    pub fn evaluate(&self, mut ruling: Ruling) -> Ruling {
        ruling.requires_review = ruling.confidence.value() < self.review_threshold;
        if ruling.requires_review {
            debug!(
                frame_id = %ruling.frame_id,
                confidence = %ruling.confidence,
                threshold = self.review_threshold,
                "ruling escalated for review"
            );
        }
        ruling
    }
}
