//! Ruling types—the fused, policy-evaluated decision for a frame.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certainty::Certainty;
use crate::error::ValidationError;
use crate::evidence::FrameId;

/// The adjudicated outcome for a frame.
///
/// The derived `Ord` encodes sanction severity:
/// `NoHandball < HandballNoSanction < HandballPenalty`. Fusion breaks ties
/// toward the lower-sanction outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No handball offence.
    NoHandball,
    /// Handball, but play continues without sanction.
    HandballNoSanction,
    /// Handball punished with a penalty.
    HandballPenalty,
}

impl Verdict {
    /// The most conservative outcome.
    #[must_use]
    pub const fn most_conservative() -> Self {
        Self::NoHandball
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHandball => write!(f, "No Handball"),
            Self::HandballNoSanction => write!(f, "Handball (No Sanction)"),
            Self::HandballPenalty => write!(f, "Handball (Penalty)"),
        }
    }
}

impl FromStr for Verdict {
    type Err = ValidationError;

    /// Parses review-collaborator input. Accepts snake_case identifiers and
    /// the display strings used on operator consoles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "no_handball" | "no handball" => Ok(Self::NoHandball),
            "handball_no_sanction" | "handball (no sanction)" | "handball no sanction" => {
                Ok(Self::HandballNoSanction)
            }
            "handball_penalty" | "handball (penalty)" | "handball penalty" => {
                Ok(Self::HandballPenalty)
            }
            _ => Err(ValidationError::UnknownVerdict {
                input: s.to_string(),
            }),
        }
    }
}

/// The fused decision for one frame.
///
/// A ruling is created once, at fusion time. Thereafter only `verdict`,
/// `requires_review`, `var_reviewed`, `review_note`, and `updated_at`
/// change, and only through the override path—which records the change as
/// a new ledger entry rather than editing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruling {
    /// The frame this ruling adjudicates.
    pub frame_id: FrameId,

    /// The outcome.
    pub verdict: Verdict,

    /// Fused confidence: the minimum of the constituent certainties.
    pub confidence: Certainty,

    /// True when the confidence fell below the review threshold.
    pub requires_review: bool,

    /// True once a human has acted on the ruling.
    pub var_reviewed: bool,

    /// Free-text audit annotation from the reviewer. Display-only; it
    /// never participates in downstream logic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,

    /// When the ruling was fused.
    pub created_at: DateTime<Utc>,

    /// When the ruling last changed.
    pub updated_at: DateTime<Utc>,
}

impl Ruling {
    /// Creates a freshly fused ruling. Review flags start cleared; the
    /// policy gate stamps `requires_review`.
    #[must_use]
    pub fn fused(frame_id: FrameId, verdict: Verdict, confidence: Certainty) -> Self {
        let now = Utc::now();
        Self {
            frame_id,
            verdict,
            confidence,
            requires_review: false,
            var_reviewed: false,
            review_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives the overridden successor state for this ruling.
    ///
    /// Keeps the fusion-time `created_at` and `confidence`; the human
    /// decision replaces the verdict and closes the review.
    #[must_use]
    pub fn overridden(&self, verdict: Verdict, note: Option<String>) -> Self {
        Self {
            frame_id: self.frame_id,
            verdict,
            confidence: self.confidence,
            requires_review: false,
            var_reviewed: true,
            review_note: note,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    /// True if the ruling may be distributed without a provisional flag.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !self.requires_review || self.var_reviewed
    }
}
