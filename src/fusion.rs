//! Fusion engine: reconciles a complete evidence set into a single ruling.
//!
//! The verdict comes from a deterministic rule table; the confidence is
//! the minimum of the constituent certainties. Any single low-confidence
//! input caps the fused result, so a high-confidence source can never mask
//! an uncertain one.

use std::sync::Arc;

use tracing::debug;

use crate::certainty::Certainty;
use crate::config::FallbackPolicy;
use crate::error::{ExecutionError, VarError, VarResult};
use crate::evidence::{EvidenceSet, EvidenceSource, HandPosition, Intent};
use crate::ruling::{Ruling, Verdict};

/// A single-value estimate from an external fallback model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackEstimate {
    /// The fallback's hand-position hint.
    pub hand_position: HandPosition,
    /// The fallback's certainty in that hint.
    pub certainty: Certainty,
}

/// External fallback consulted when the pose model cannot localize hands.
///
/// Implementations wrap whatever secondary estimation exists downstream
/// (another camera angle, a coarser detector). The contract is a single
/// `(hint, certainty)` pair; anything richer stays outside the core.
pub trait FallbackModel: Send + Sync {
    /// Estimates a hand position for the frame.
    fn estimate(&self, frame_id: crate::evidence::FrameId) -> FallbackEstimate;
}

/// Default fallback: maximally uncertain, conservative hint.
///
/// With zero certainty the substituted contribution floors the fused
/// confidence, so the ruling always escalates to human review.
#[derive(Debug, Default, Clone, Copy)]
pub struct UncertainFallback;

impl FallbackModel for UncertainFallback {
    fn estimate(&self, _frame_id: crate::evidence::FrameId) -> FallbackEstimate {
        FallbackEstimate {
            hand_position: HandPosition::Natural,
            certainty: Certainty::zero(),
        }
    }
}

/// Combines per-source evidence into a ruling.
#[derive(Clone)]
pub struct FusionEngine {
    fallback_policy: FallbackPolicy,
    fallback: Arc<dyn FallbackModel>,
}

impl FusionEngine {
    /// Creates a fusion engine with the default fallback model.
    #[must_use]
    pub fn new(fallback_policy: FallbackPolicy) -> Self {
        Self::with_fallback(fallback_policy, Arc::new(UncertainFallback))
    }

    /// Creates a fusion engine with an explicit fallback model.
    #[must_use]
    pub fn with_fallback(
        fallback_policy: FallbackPolicy,
        fallback: Arc<dyn FallbackModel>,
    ) -> Self {
        Self {
            fallback_policy,
            fallback,
        }
    }

    /// Fuses a complete evidence set into a ruling.
    ///
    /// The returned ruling has its review flags cleared; the policy gate
    /// stamps them.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::IncompleteEvidence` when a required source
    /// is missing, or when pose hands are undetected under
    /// [`FallbackPolicy::Defer`]. This is the internal "not yet" signal.
    pub fn fuse(&self, set: &EvidenceSet) -> VarResult<Ruling> {
        let missing = set.missing(&EvidenceSource::REQUIRED);
        if !missing.is_empty() {
            return Err(ExecutionError::IncompleteEvidence {
                frame_id: set.frame_id,
                missing,
            }
            .into());
        }

        let pose = expect_pose(set)?;
        let contact = expect_contact(set)?;
        let context = expect_context(set)?;

        let (hand_position, pose_certainty) = match pose.hand_position {
            HandPosition::Undetected => match self.fallback_policy {
                FallbackPolicy::Defer => {
                    debug!(frame_id = %set.frame_id, "pose undetected, fusion deferred");
                    return Err(ExecutionError::IncompleteEvidence {
                        frame_id: set.frame_id,
                        missing: vec![EvidenceSource::Pose],
                    }
                    .into());
                }
                FallbackPolicy::Substitute => {
                    let estimate = self.fallback.estimate(set.frame_id);
                    debug!(
                        frame_id = %set.frame_id,
                        certainty = %estimate.certainty,
                        "pose undetected, substituting fallback estimate"
                    );
                    // A fallback that also fails to localize reads as natural.
                    let hint = match estimate.hand_position {
                        HandPosition::Undetected => HandPosition::Natural,
                        other => other,
                    };
                    (hint, estimate.certainty)
                }
            },
            detected => (detected, pose.certainty),
        };

        let verdict = rule_table(hand_position, contact.contact, context.intent, context.rule_violation);
        let confidence =
            Certainty::min_of([pose_certainty, contact.certainty, context.certainty]);

        debug!(
            frame_id = %set.frame_id,
            %verdict,
            %confidence,
            "evidence fused"
        );

        Ok(Ruling::fused(set.frame_id, verdict, confidence))
    }
}

/// The deterministic verdict rule table.
///
/// Handball is asserted only when contact occurred AND the hand position
/// was unnatural; penalty severity additionally requires intentional play
/// AND a rule violation. Everything else resolves to the weaker category.
fn rule_table(
    hand_position: HandPosition,
    contact: bool,
    intent: Intent,
    rule_violation: bool,
) -> Verdict {
    if !(contact && hand_position == HandPosition::Unnatural) {
        return Verdict::most_conservative();
    }
    if intent == Intent::Intentional && rule_violation {
        Verdict::HandballPenalty
    } else {
        Verdict::HandballNoSanction
    }
}

struct PoseView {
    hand_position: HandPosition,
    certainty: Certainty,
}

struct ContactView {
    contact: bool,
    certainty: Certainty,
}

struct ContextView {
    intent: Intent,
    rule_violation: bool,
    certainty: Certainty,
}

fn expect_pose(set: &EvidenceSet) -> VarResult<PoseView> {
    let ev = set
        .get(EvidenceSource::Pose)
        .ok_or_else(|| VarError::internal("pose evidence vanished after completeness check"))?;
    match &ev.payload {
        crate::evidence::EvidencePayload::Pose { hand_position, .. } => Ok(PoseView {
            hand_position: *hand_position,
            certainty: ev.certainty,
        }),
        _ => Err(VarError::internal("evidence stored under wrong source key")),
    }
}

fn expect_contact(set: &EvidenceSet) -> VarResult<ContactView> {
    let ev = set.get(EvidenceSource::BallContact).ok_or_else(|| {
        VarError::internal("ball-contact evidence vanished after completeness check")
    })?;
    match &ev.payload {
        crate::evidence::EvidencePayload::BallContact { contact, .. } => Ok(ContactView {
            contact: *contact,
            certainty: ev.certainty,
        }),
        _ => Err(VarError::internal("evidence stored under wrong source key")),
    }
}

fn expect_context(set: &EvidenceSet) -> VarResult<ContextView> {
    let ev = set
        .get(EvidenceSource::Context)
        .ok_or_else(|| VarError::internal("context evidence vanished after completeness check"))?;
    match &ev.payload {
        crate::evidence::EvidencePayload::Context {
            intent,
            rule_violation,
        } => Ok(ContextView {
            intent: *intent,
            rule_violation: *rule_violation,
            certainty: ev.certainty,
        }),
        _ => Err(VarError::internal("evidence stored under wrong source key")),
    }
}
