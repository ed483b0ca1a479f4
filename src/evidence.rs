//! Evidence types—per-frame perception model outputs.
//!
//! Each perception model (pose estimation, ball-contact detection, event
//! context classification) submits one structured record per frame. The
//! payload is a tagged union per source so the fusion engine can match
//! exhaustively instead of probing loosely-typed fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certainty::Certainty;
use crate::error::ValidationError;

/// Stable identifier for a single video frame carrying a potential incident.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FrameId(u64);

impl FrameId {
    /// Creates a frame ID from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The perception model a piece of evidence came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Player pose estimation.
    Pose,
    /// Ball-to-hand contact detection.
    BallContact,
    /// Event context classification.
    Context,
}

impl EvidenceSource {
    /// All sources required before fusion may run.
    pub const REQUIRED: [Self; 3] = [Self::Pose, Self::BallContact, Self::Context];
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pose => write!(f, "pose"),
            Self::BallContact => write!(f, "ball_contact"),
            Self::Context => write!(f, "context"),
        }
    }
}

/// Hand position classification from the pose model.
///
/// `Undetected` is the non-detection signal: the model could not localize
/// the hands, and the configured fallback policy decides what happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandPosition {
    Natural,
    Unnatural,
    Undetected,
}

/// Intent classification from the context model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Intentional,
    Accidental,
}

/// Source-specific structured payload.
///
/// One variant per perception model; the variant determines the
/// [`EvidenceSource`] key the record is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidencePayload {
    Pose {
        /// Hand position classification.
        hand_position: HandPosition,

        /// Joint angles in degrees, keyed by joint name (elbow, shoulder, ...).
        #[serde(default)]
        limb_angles: BTreeMap<String, f32>,
    },

    BallContact {
        /// Whether ball-hand contact occurred.
        contact: bool,

        /// Measured impact force.
        impact_force: f32,

        /// Duration of contact in seconds.
        contact_duration: f32,

        /// Which sensor produced the contact reading.
        #[serde(skip_serializing_if = "Option::is_none")]
        sensor_source: Option<String>,
    },

    Context {
        /// Whether the contact was judged intentional.
        intent: Intent,

        /// Whether the laws of the game were violated.
        rule_violation: bool,
    },
}

impl EvidencePayload {
    /// The source this payload belongs to.
    #[must_use]
    pub const fn source(&self) -> EvidenceSource {
        match self {
            Self::Pose { .. } => EvidenceSource::Pose,
            Self::BallContact { .. } => EvidenceSource::BallContact,
            Self::Context { .. } => EvidenceSource::Context,
        }
    }

    /// Validates payload measurements.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for non-finite or negative physical
    /// measurements. Categorical fields are already total by construction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Pose { limb_angles, .. } => {
                for angle in limb_angles.values() {
                    if !angle.is_finite() {
                        return Err(ValidationError::NonFiniteMeasurement {
                            field: "limb_angles",
                            value: *angle,
                        });
                    }
                }
                Ok(())
            }
            Self::BallContact {
                impact_force,
                contact_duration,
                ..
            } => {
                for (field, value) in [
                    ("impact_force", *impact_force),
                    ("contact_duration", *contact_duration),
                ] {
                    if !value.is_finite() {
                        return Err(ValidationError::NonFiniteMeasurement { field, value });
                    }
                    if value < 0.0 {
                        return Err(ValidationError::NegativeMeasurement { field, value });
                    }
                }
                Ok(())
            }
            Self::Context { .. } => Ok(()),
        }
    }
}

/// One perception model's structured output for one frame.
///
/// Immutable once written; a newer record with the same
/// `(frame_id, source)` key supersedes it (latest wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvidence {
    /// The frame this evidence describes.
    pub frame_id: FrameId,

    /// Source-specific payload; determines the source key.
    pub payload: EvidencePayload,

    /// The source model's self-reported certainty.
    pub certainty: Certainty,

    /// When this record was created.
    pub recorded_at: DateTime<Utc>,
}

impl FrameEvidence {
    /// Creates a validated evidence record.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the payload measurements are
    /// malformed. Certainty range is enforced by [`Certainty`] itself.
    pub fn new(
        frame_id: FrameId,
        payload: EvidencePayload,
        certainty: Certainty,
    ) -> Result<Self, ValidationError> {
        payload.validate()?;
        Ok(Self {
            frame_id,
            payload,
            certainty,
            recorded_at: Utc::now(),
        })
    }

    /// The source this record came from.
    #[must_use]
    pub const fn source(&self) -> EvidenceSource {
        self.payload.source()
    }
}

/// The evidence collected for one frame, keyed by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    /// The frame the set belongs to.
    pub frame_id: FrameId,

    /// Latest record per source.
    pub by_source: BTreeMap<EvidenceSource, FrameEvidence>,
}

impl EvidenceSet {
    /// Creates an empty set for a frame.
    #[must_use]
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            by_source: BTreeMap::new(),
        }
    }

    /// The latest record for a source, if any.
    #[must_use]
    pub fn get(&self, source: EvidenceSource) -> Option<&FrameEvidence> {
        self.by_source.get(&source)
    }

    /// Sources from `required` that have not arrived yet.
    #[must_use]
    pub fn missing(&self, required: &[EvidenceSource]) -> Vec<EvidenceSource> {
        required
            .iter()
            .copied()
            .filter(|s| !self.by_source.contains_key(s))
            .collect()
    }

    /// True once every required source has a record.
    #[must_use]
    pub fn is_complete(&self, required: &[EvidenceSource]) -> bool {
        self.missing(required).is_empty()
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self(0)
    }
}
