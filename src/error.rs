//! Error types for varcore.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific failure conditions at the API boundary and keeps
//! the core available after any single frame's failure.

use thiserror::Error;

use crate::evidence::{EvidenceSource, FrameId};

/// Validation errors that occur at the ingestion boundary.
///
/// A validation failure is rejected before any state is touched; it is
/// never partially applied.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Certainty value {value} is out of range [0.0, 100.0]")]
    CertaintyOutOfRange {
        value: f32,
    },

    #[error("Measurement '{field}' must be finite, got {value}")]
    NonFiniteMeasurement {
        field: &'static str,
        value: f32,
    },

    #[error("Measurement '{field}' must be non-negative, got {value}")]
    NegativeMeasurement {
        field: &'static str,
        value: f32,
    },

    #[error("Unknown verdict: '{input}'")]
    UnknownVerdict {
        input: String,
    },

    #[error("Review threshold {value} is out of range [0.0, 100.0]")]
    ThresholdOutOfRange {
        value: f32,
    },

    #[error("Delivery target name cannot be empty")]
    EmptyTargetName,
}

/// Execution errors that occur while operating the pipeline.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("No decision recorded for frame {frame_id}")]
    FrameNotFound {
        frame_id: FrameId,
    },

    /// Internal "not yet" signal: fusion was attempted before the required
    /// evidence set arrived. Never surfaced to external callers.
    #[error("Evidence for frame {frame_id} is incomplete (missing: {missing:?})")]
    IncompleteEvidence {
        frame_id: FrameId,
        missing: Vec<EvidenceSource>,
    },

    #[error("Frame {frame_id} has already been reviewed; a human decision is final")]
    AlreadyReviewed {
        frame_id: FrameId,
    },

    #[error("Frame {frame_id} awaits review; pass provisional=true to distribute anyway")]
    UnreviewedRuling {
        frame_id: FrameId,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },
}

/// Top-level error type for varcore.
///
/// This enum encompasses all failures the core can surface. Per-target
/// delivery faults are deliberately absent: they are collected into the
/// [`DistributionReport`](crate::publish::DistributionReport) instead of
/// aborting a distribution.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl VarError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error references an unknown frame.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::FrameNotFound { .. })
        )
    }

    /// Returns true if the operation may succeed once more evidence arrives.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::IncompleteEvidence { .. })
        )
    }
}

impl From<crate::storage::StorageError> for VarError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::Execution(ExecutionError::Storage {
            message: err.to_string(),
        })
    }
}

/// Result type alias for varcore operations.
pub type VarResult<T> = Result<T, VarError>;
