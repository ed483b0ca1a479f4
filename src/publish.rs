//! Publisher: hands finalized rulings to downstream distribution targets.
//!
//! Delivery is the only part of the core with unbounded latency, so every
//! target runs on its own thread against a shared deadline. A slow or
//! failing target never blocks its siblings and never aborts the
//! distribution; the report carries one outcome per target.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ExecutionError, ValidationError, VarResult};
use crate::evidence::FrameId;
use crate::storage::{DecisionStore, LedgerEntry};

/// Why a target refused or failed a delivery.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct DeliveryFault {
    /// Human-readable failure description.
    pub reason: String,
}

impl DeliveryFault {
    /// Creates a fault with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A downstream distribution endpoint (referee device, broadcast, archive).
///
/// Implementations wrap the actual transport, which lives outside the
/// core. `deliver` may block; the publisher enforces the deadline.
pub trait DeliveryTarget: Send + Sync {
    /// Stable target name used in reports and logs.
    fn name(&self) -> &str;

    /// Attempts to deliver the ledger entry.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryFault`] describing why the target could not
    /// accept the record.
    fn deliver(&self, entry: &LedgerEntry) -> Result<(), DeliveryFault>;
}

/// A target that records the delivery in the structured log.
///
/// Stands in for endpoints whose real transport is deployed elsewhere;
/// the default target set mirrors the production endpoints.
#[derive(Debug, Clone)]
pub struct LogTarget {
    name: String,
}

impl LogTarget {
    /// Creates a named log target.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTargetName` for a blank name.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyTargetName);
        }
        Ok(Self { name })
    }
}

impl DeliveryTarget for LogTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, entry: &LedgerEntry) -> Result<(), DeliveryFault> {
        info!(
            target_name = %self.name,
            frame_id = %entry.ruling.frame_id,
            verdict = %entry.ruling.verdict,
            confidence = %entry.ruling.confidence,
            var_reviewed = entry.ruling.var_reviewed,
            "decision delivered"
        );
        Ok(())
    }
}

/// Per-target delivery result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The target accepted the record.
    Delivered,

    /// The target rejected the record or was unreachable.
    Failed {
        /// Failure description from the target.
        reason: String,
    },

    /// The target did not answer within the deadline. Its delivery
    /// attempt keeps running detached; siblings are unaffected.
    TimedOut {
        /// The deadline that expired, in milliseconds.
        after_ms: u64,
    },
}

/// One target's outcome within a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    /// Target name.
    pub target: String,

    /// What happened.
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// The result of distributing one frame's ruling.
///
/// Contains exactly one outcome per configured target; partial failure is
/// expected and reported, never escalated to a hard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Unique ID for this distribution attempt.
    pub distribution_id: Uuid,

    /// The frame whose ruling was distributed.
    pub frame_id: FrameId,

    /// True when the caller acknowledged an unreviewed ruling.
    pub provisional: bool,

    /// Per-target outcomes, in configuration order.
    pub outcomes: Vec<TargetOutcome>,

    /// When the distribution finished.
    pub completed_at: DateTime<Utc>,
}

impl DistributionReport {
    /// Number of targets that accepted the record.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Delivered)
            .count()
    }

    /// True when every target accepted the record.
    #[must_use]
    pub fn all_delivered(&self) -> bool {
        self.delivered_count() == self.outcomes.len()
    }
}

/// Distributes finalized rulings to the configured targets.
#[derive(Clone)]
pub struct Publisher {
    ledger: Arc<dyn DecisionStore>,
    targets: Vec<Arc<dyn DeliveryTarget>>,
    timeout: Duration,
}

impl Publisher {
    /// Creates a publisher with the default target set: referee
    /// smartwatch, TV broadcast, and the cloud archive.
    #[must_use]
    pub fn new(ledger: Arc<dyn DecisionStore>, timeout: Duration) -> Self {
        Self::with_targets(ledger, Self::default_targets(), timeout)
    }

    /// Creates a publisher with an explicit target set.
    #[must_use]
    pub fn with_targets(
        ledger: Arc<dyn DecisionStore>,
        targets: Vec<Arc<dyn DeliveryTarget>>,
        timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            targets,
            timeout,
        }
    }

    /// The built-in log-backed stand-ins for the production endpoints.
    #[must_use]
    pub fn default_targets() -> Vec<Arc<dyn DeliveryTarget>> {
        ["referee-smartwatch", "tv-broadcast", "cloud-archive"]
            .into_iter()
            .map(|name| {
                let target: Arc<dyn DeliveryTarget> =
                    Arc::new(LogTarget::new(name).expect("built-in target names are non-empty"));
                target
            })
            .collect()
    }

    /// Distributes the latest ruling state for `frame_id` to every target.
    ///
    /// An unreviewed ruling that `requires_review` is only distributable
    /// with `provisional = true`; the publisher never silently suppresses
    /// it and never silently ships it.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::FrameNotFound` when the frame has no ledger entry.
    /// - `ExecutionError::UnreviewedRuling` when the provisional flag is
    ///   required but absent.
    ///
    /// Per-target faults never surface here; they land in the report.
    pub fn distribute(
        &self,
        frame_id: FrameId,
        provisional: bool,
    ) -> VarResult<DistributionReport> {
        let entry = self
            .ledger
            .latest(frame_id)?
            .ok_or(ExecutionError::FrameNotFound { frame_id })?;

        if !entry.ruling.is_final() && !provisional {
            return Err(ExecutionError::UnreviewedRuling { frame_id }.into());
        }

        let distribution_id = Uuid::new_v4();
        info!(
            %distribution_id,
            %frame_id,
            provisional,
            targets = self.targets.len(),
            "distribution started"
        );

        // Start every delivery before waiting on any: the deadline is
        // shared, so one slow target cannot eat a sibling's budget.
        let started = Instant::now();
        let pending: Vec<(String, Receiver<Result<(), DeliveryFault>>)> = self
            .targets
            .iter()
            .map(|target| {
                let (tx, rx) = bounded::<Result<(), DeliveryFault>>(1);
                let name = target.name().to_string();
                let worker = Arc::clone(target);
                let entry = entry.clone();
                thread::spawn(move || {
                    let _ = tx.send(worker.deliver(&entry));
                });
                (name, rx)
            })
            .collect();

        let deadline = started + self.timeout;
        let outcomes = pending
            .into_iter()
            .map(|(name, rx)| {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let status = match rx.recv_timeout(remaining) {
                    Ok(Ok(())) => DeliveryStatus::Delivered,
                    Ok(Err(fault)) => {
                        warn!(target_name = %name, %frame_id, error = %fault, "delivery failed");
                        DeliveryStatus::Failed {
                            reason: fault.reason,
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        warn!(target_name = %name, %frame_id, "delivery timed out");
                        DeliveryStatus::TimedOut {
                            after_ms: self.timeout.as_millis().min(u128::from(u64::MAX)) as u64,
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => DeliveryStatus::Failed {
                        reason: "delivery worker disconnected".to_string(),
                    },
                };
                TargetOutcome {
                    target: name,
                    status,
                }
            })
            .collect();

        Ok(DistributionReport {
            distribution_id,
            frame_id,
            provisional,
            outcomes,
            completed_at: Utc::now(),
        })
    }
}
