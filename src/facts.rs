//! Fact store: per-frame partial evidence, keyed by frame and source.
//!
//! Evidence for a frame arrives from three independent models in any
//! order, possibly concurrently. Each frame gets its own lock so writers
//! on unrelated frames never contend; the outer map lock is held only long
//! enough to find or create the frame slot.
//!
//! Completion of the required source set claims a per-frame marker under
//! the frame lock, so exactly one writer observes the transition to
//! complete and triggers fusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{VarError, VarResult};
use crate::evidence::{EvidenceSet, EvidenceSource, FrameEvidence, FrameId};

fn lock_err(context: &'static str) -> VarError {
    VarError::internal(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct FrameFacts {
    evidence: EvidenceSet,
    fusion_claimed: bool,
}

/// Outcome of an evidence submission.
#[derive(Debug)]
pub enum EvidenceStatus {
    /// The required set is still incomplete.
    Pending {
        /// Sources that have not reported yet.
        missing: Vec<EvidenceSource>,
    },

    /// This submission completed the required set. Returned to exactly one
    /// caller per frame; the receiver must run fusion.
    Complete(EvidenceSet),

    /// The frame was already fused; the record was stored but fusion does
    /// not fire again.
    AlreadyFused,
}

/// Thread-safe store of per-frame partial evidence.
#[derive(Debug, Default)]
pub struct FactStore {
    frames: RwLock<HashMap<FrameId, Arc<Mutex<FrameFacts>>>>,
}

impl FactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, frame_id: FrameId) -> VarResult<Arc<Mutex<FrameFacts>>> {
        {
            let frames = self.frames.read().map_err(|_| lock_err("facts.read"))?;
            if let Some(slot) = frames.get(&frame_id) {
                return Ok(Arc::clone(slot));
            }
        }

        let mut frames = self.frames.write().map_err(|_| lock_err("facts.write"))?;
        let slot = frames.entry(frame_id).or_insert_with(|| {
            Arc::new(Mutex::new(FrameFacts {
                evidence: EvidenceSet::new(frame_id),
                fusion_claimed: false,
            }))
        });
        Ok(Arc::clone(slot))
    }

    /// Records evidence for `(frame_id, source)`, latest wins.
    ///
    /// Returns [`EvidenceStatus::Complete`] to exactly one caller per
    /// frame: the one whose write completed the required set (or the first
    /// to write after it was completed, when writers race the map so
    /// tightly that completion and claim coincide). Out-of-order and
    /// repeated arrival are tolerated.
    ///
    /// # Errors
    ///
    /// Propagates poisoned-lock failures as internal errors. Certainty and
    /// payload validation happen before construction of `FrameEvidence`,
    /// so malformed records never reach the store.
    pub fn put_evidence(&self, evidence: FrameEvidence) -> VarResult<EvidenceStatus> {
        let frame_id = evidence.frame_id;
        let slot = self.slot(frame_id)?;
        let mut facts = slot.lock().map_err(|_| lock_err("facts.frame"))?;

        facts
            .evidence
            .by_source
            .insert(evidence.source(), evidence);

        if facts.fusion_claimed {
            return Ok(EvidenceStatus::AlreadyFused);
        }

        let missing = facts.evidence.missing(&EvidenceSource::REQUIRED);
        if missing.is_empty() {
            facts.fusion_claimed = true;
            return Ok(EvidenceStatus::Complete(facts.evidence.clone()));
        }

        Ok(EvidenceStatus::Pending { missing })
    }

    /// Releases the fusion claim for a frame so a later submission may
    /// trigger fusion again. Used when fusion was deferred by policy.
    pub fn release_fusion_claim(&self, frame_id: FrameId) -> VarResult<()> {
        let slot = self.slot(frame_id)?;
        let mut facts = slot.lock().map_err(|_| lock_err("facts.frame"))?;
        facts.fusion_claimed = false;
        Ok(())
    }

    /// The current evidence set for a frame, if any has arrived.
    pub fn get_evidence_set(&self, frame_id: FrameId) -> VarResult<Option<EvidenceSet>> {
        let frames = self.frames.read().map_err(|_| lock_err("facts.read"))?;
        let Some(slot) = frames.get(&frame_id) else {
            return Ok(None);
        };
        let facts = slot.lock().map_err(|_| lock_err("facts.frame"))?;
        Ok(Some(facts.evidence.clone()))
    }

    /// True once every source in `required` has reported for the frame.
    pub fn is_complete(
        &self,
        frame_id: FrameId,
        required: &[EvidenceSource],
    ) -> VarResult<bool> {
        Ok(self
            .get_evidence_set(frame_id)?
            .is_some_and(|set| set.is_complete(required)))
    }
}
