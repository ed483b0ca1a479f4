//! Decision core: the facade composing the fused pipeline.
//!
//! Evidence flows in through [`DecisionCore::submit_evidence`]; when the
//! required set completes, fusion, policy evaluation, and the ledger
//! append run synchronously in the submitting call (push model). The
//! ledger instance is injected at construction, so tests and embedders
//! control its lifecycle.

use std::sync::Arc;

use tracing::info;

use crate::config::CoreConfig;
use crate::error::{ExecutionError, VarResult};
use crate::evidence::{EvidencePayload, EvidenceSource, FrameEvidence, FrameId};
use crate::facts::{EvidenceStatus, FactStore};
use crate::fusion::{FallbackModel, FusionEngine};
use crate::policy::PolicyGate;
use crate::publish::{DeliveryTarget, DistributionReport, Publisher};
use crate::review::OverrideHandler;
use crate::ruling::{Ruling, Verdict};
use crate::storage::{DecisionStore, EntryId, InMemoryDecisionStore, LedgerEntry};

/// Outcome of an evidence submission.
#[derive(Debug)]
pub enum EvidenceAck {
    /// Stored; the frame still waits for other sources.
    Pending {
        /// The frame the evidence belongs to.
        frame_id: FrameId,
        /// Sources that have not reported yet.
        missing: Vec<EvidenceSource>,
    },

    /// This submission completed the set; the fused, policy-evaluated
    /// ruling is now on the ledger.
    Fused {
        /// The recorded ruling.
        ruling: Ruling,
        /// Its ledger entry.
        entry_id: EntryId,
    },

    /// Stored, but the frame was already fused; the ruling on the ledger
    /// is unchanged (override is the only way to change it).
    AlreadyFused {
        /// The frame the evidence belongs to.
        frame_id: FrameId,
    },

    /// The set completed but fusion deferred (non-detection under
    /// [`FallbackPolicy::Defer`](crate::config::FallbackPolicy::Defer));
    /// a re-submission may trigger fusion again.
    Deferred {
        /// The frame the evidence belongs to.
        frame_id: FrameId,
    },
}

/// The decision-fusion pipeline.
///
/// Cheap to clone; clones share the same stores.
///
/// # Examples
///
/// ```
/// use varcore::{CoreConfig, DecisionCore, EvidencePayload, FrameId, HandPosition};
///
/// let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
/// core.submit_evidence(
///     FrameId::new(4004),
///     EvidencePayload::Pose {
///         hand_position: HandPosition::Unnatural,
///         limb_angles: Default::default(),
///     },
///     94.5,
/// )
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct DecisionCore {
    facts: Arc<FactStore>,
    fusion: FusionEngine,
    gate: PolicyGate,
    ledger: Arc<dyn DecisionStore>,
    overrides: OverrideHandler,
    publisher: Publisher,
}

impl DecisionCore {
    /// Creates a core over an injected ledger with default fallback model
    /// and delivery targets.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the configuration is invalid.
    pub fn new(config: CoreConfig, ledger: Arc<dyn DecisionStore>) -> VarResult<Self> {
        Self::with_parts(config, ledger, None, None)
    }

    /// Creates a core over a fresh in-memory ledger.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the configuration is invalid.
    pub fn in_memory(config: CoreConfig) -> VarResult<Self> {
        Self::new(config, Arc::new(InMemoryDecisionStore::new()))
    }

    /// Creates a core with explicit fallback model and delivery targets.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the configuration is invalid.
    pub fn with_parts(
        config: CoreConfig,
        ledger: Arc<dyn DecisionStore>,
        fallback: Option<Arc<dyn FallbackModel>>,
        targets: Option<Vec<Arc<dyn DeliveryTarget>>>,
    ) -> VarResult<Self> {
        config.validate()?;

        let fusion = match fallback {
            Some(model) => FusionEngine::with_fallback(config.fallback_policy, model),
            None => FusionEngine::new(config.fallback_policy),
        };
        let publisher = match targets {
            Some(targets) => {
                Publisher::with_targets(Arc::clone(&ledger), targets, config.delivery_timeout)
            }
            None => Publisher::new(Arc::clone(&ledger), config.delivery_timeout),
        };

        Ok(Self {
            facts: Arc::new(FactStore::new()),
            fusion,
            gate: PolicyGate::new(config.review_threshold),
            overrides: OverrideHandler::new(Arc::clone(&ledger)),
            publisher,
            ledger,
        })
    }

    /// Ingests one perception model's output for a frame.
    ///
    /// Out-of-order and repeated arrival are tolerated (latest wins per
    /// source). The submission that completes the required set also runs
    /// fusion, the policy gate, and the ledger append before returning.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for out-of-range certainty or
    /// malformed payload measurements; nothing is stored in that case.
    pub fn submit_evidence(
        &self,
        frame_id: FrameId,
        payload: EvidencePayload,
        certainty: f32,
    ) -> VarResult<EvidenceAck> {
        let certainty = crate::certainty::Certainty::new(certainty)?;
        let evidence = FrameEvidence::new(frame_id, payload, certainty)?;

        match self.facts.put_evidence(evidence)? {
            EvidenceStatus::Pending { missing } => Ok(EvidenceAck::Pending { frame_id, missing }),
            EvidenceStatus::AlreadyFused => Ok(EvidenceAck::AlreadyFused { frame_id }),
            EvidenceStatus::Complete(set) => match self.fusion.fuse(&set) {
                Ok(ruling) => {
                    let ruling = self.gate.evaluate(ruling);
                    let entry_id = self.ledger.append(ruling.clone())?;
                    info!(
                        %frame_id,
                        %entry_id,
                        verdict = %ruling.verdict,
                        confidence = %ruling.confidence,
                        requires_review = ruling.requires_review,
                        "ruling recorded"
                    );
                    Ok(EvidenceAck::Fused { ruling, entry_id })
                }
                Err(err) if err.is_incomplete() => {
                    // Deferred by fallback policy: free the claim so the
                    // next submission can complete the set again.
                    self.facts.release_fusion_claim(frame_id)?;
                    Ok(EvidenceAck::Deferred { frame_id })
                }
                Err(err) => Err(err),
            },
        }
    }

    /// The latest ruling state for a frame (an override wins over the
    /// original fusion result).
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::FrameNotFound` for an unknown frame.
    pub fn get_decision(&self, frame_id: FrameId) -> VarResult<Ruling> {
        let entry = self
            .ledger
            .latest(frame_id)?
            .ok_or(ExecutionError::FrameNotFound { frame_id })?;
        Ok(entry.ruling)
    }

    /// The full decision history in append order, overrides included.
    ///
    /// # Errors
    ///
    /// Propagates ledger storage failures.
    pub fn list_decisions(&self) -> VarResult<Vec<LedgerEntry>> {
        Ok(self.ledger.list()?)
    }

    /// Records a human override (or confirmation) for a frame.
    ///
    /// # Errors
    ///
    /// See [`OverrideHandler::apply_override`].
    pub fn override_decision(
        &self,
        frame_id: FrameId,
        verdict: Verdict,
        note: Option<String>,
    ) -> VarResult<Ruling> {
        self.overrides.apply_override(frame_id, verdict, note)
    }

    /// Distributes the latest ruling state for a frame.
    ///
    /// # Errors
    ///
    /// See [`Publisher::distribute`].
    pub fn distribute_decision(
        &self,
        frame_id: FrameId,
        provisional: bool,
    ) -> VarResult<DistributionReport> {
        self.publisher.distribute(frame_id, provisional)
    }

    /// Direct access to the evidence store, for diagnostic surfaces.
    #[must_use]
    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// The injected ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn DecisionStore> {
        &self.ledger
    }
}
