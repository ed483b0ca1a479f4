//! Override handler: records human corrections against recorded rulings.
//!
//! An override never edits history. It appends a new ledger entry for the
//! same frame with `var_reviewed` set, so `latest()` serves the human
//! decision while `history()` keeps the machine's original proposal.

use std::sync::Arc;

use tracing::info;

use crate::error::{ExecutionError, VarResult};
use crate::evidence::FrameId;
use crate::ruling::{Ruling, Verdict};
use crate::storage::DecisionStore;

/// Applies human review decisions to the ledger.
#[derive(Clone)]
pub struct OverrideHandler {
    ledger: Arc<dyn DecisionStore>,
}

impl OverrideHandler {
    /// Creates a handler over the shared ledger.
    #[must_use]
    pub fn new(ledger: Arc<dyn DecisionStore>) -> Self {
        Self { ledger }
    }

    /// Records an override for `frame_id`.
    ///
    /// The target frame must already have a ledger entry, and at most one
    /// override is permitted per frame: a human decision is final. A
    /// confirmation of the fused verdict is expressed as an override
    /// carrying the same verdict. The optional note is an audit-only
    /// annotation.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::FrameNotFound` when the frame was never fused.
    /// - `ExecutionError::AlreadyReviewed` on a second override.
    pub fn apply_override(
        &self,
        frame_id: FrameId,
        verdict: Verdict,
        note: Option<String>,
    ) -> VarResult<Ruling> {
        let current = self
            .ledger
            .latest(frame_id)?
            .ok_or(ExecutionError::FrameNotFound { frame_id })?;

        if current.ruling.var_reviewed {
            return Err(ExecutionError::AlreadyReviewed { frame_id }.into());
        }

        let overridden = current.ruling.overridden(verdict, note);
        let entry_id = self.ledger.append(overridden.clone())?;

        info!(
            %frame_id,
            %entry_id,
            fused_verdict = %current.ruling.verdict,
            override_verdict = %verdict,
            "override recorded"
        );

        Ok(overridden)
    }
}
