//! # varcore - Decision-fusion core for AI-assisted football officiating
//!
//! varcore ingests per-frame inference results from independent perception
//! models (player pose, ball contact, situational context), reconciles them
//! into a single ruling with a confidence score, applies policy thresholds
//! (auto-accept vs. escalate to human review), accepts and persists manual
//! overrides, and exposes the final, append-only decision history for
//! distribution and audit.
//!
//! ## Core Concepts
//!
//! - **Evidence**: one perception model's structured output for a frame
//! - **Certainty**: a validated 0-100 confidence score; fused rulings take
//!   the minimum across sources
//! - **Ruling**: the fused, policy-evaluated decision for a frame
//! - **Ledger**: append-only decision history; overrides append, never edit
//!
//! ## Usage
//!
//! ```rust
//! use varcore::{
//!     CoreConfig, DecisionCore, EvidencePayload, FrameId, HandPosition, Intent, Verdict,
//! };
//!
//! let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
//! let frame = FrameId::new(4004);
//!
//! core.submit_evidence(
//!     frame,
//!     EvidencePayload::Pose {
//!         hand_position: HandPosition::Unnatural,
//!         limb_angles: Default::default(),
//!     },
//!     94.5,
//! )
//! .unwrap();
//! core.submit_evidence(
//!     frame,
//!     EvidencePayload::BallContact {
//!         contact: true,
//!         impact_force: 3.2,
//!         contact_duration: 0.04,
//!         sensor_source: None,
//!     },
//!     97.0,
//! )
//! .unwrap();
//! core.submit_evidence(
//!     frame,
//!     EvidencePayload::Context {
//!         intent: Intent::Intentional,
//!         rule_violation: true,
//!     },
//!     92.5,
//! )
//! .unwrap();
//!
//! let ruling = core.get_decision(frame).unwrap();
//! assert_eq!(ruling.verdict, Verdict::HandballPenalty);
//! assert!(ruling.requires_review); // 92.5 < 95.0 default threshold
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod certainty;
pub mod config;
pub mod error;
pub mod evidence;
pub mod ruling;

// Pipeline stages
pub mod engine;
pub mod facts;
pub mod fusion;
pub mod policy;
pub mod publish;
pub mod review;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use certainty::Certainty;
pub use config::{CoreConfig, FallbackPolicy};
pub use engine::{DecisionCore, EvidenceAck};
pub use error::{ExecutionError, ValidationError, VarError, VarResult};
pub use evidence::{
    EvidencePayload, EvidenceSet, EvidenceSource, FrameEvidence, FrameId, HandPosition, Intent,
};
pub use facts::{EvidenceStatus, FactStore};
pub use fusion::{FallbackEstimate, FallbackModel, FusionEngine, UncertainFallback};
pub use policy::PolicyGate;
pub use publish::{
    DeliveryFault, DeliveryStatus, DeliveryTarget, DistributionReport, LogTarget, Publisher,
    TargetOutcome,
};
pub use review::OverrideHandler;
pub use ruling::{Ruling, Verdict};
pub use storage::{DecisionStore, EntryId, InMemoryDecisionStore, LedgerEntry, StorageError};

#[cfg(feature = "persistent")]
pub use storage::JournalDecisionStore;
