use std::sync::Arc;
use std::thread;
use std::time::Duration;

use varcore::{
    CoreConfig, DecisionCore, DeliveryFault, DeliveryStatus, DeliveryTarget, EvidenceAck,
    EvidencePayload, FrameId, HandPosition, InMemoryDecisionStore, Intent, LedgerEntry,
    LogTarget, Verdict,
};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pose(hand: HandPosition) -> EvidencePayload {
    EvidencePayload::Pose {
        hand_position: hand,
        limb_angles: [("elbow".to_string(), 121.0), ("shoulder".to_string(), 74.5)]
            .into_iter()
            .collect(),
    }
}

fn ball_contact(contact: bool) -> EvidencePayload {
    EvidencePayload::BallContact {
        contact,
        impact_force: 3.2,
        contact_duration: 0.04,
        sensor_source: Some("broadcast-cam-4".to_string()),
    }
}

fn context(intent: Intent, rule_violation: bool) -> EvidencePayload {
    EvidencePayload::Context {
        intent,
        rule_violation,
    }
}

#[test]
fn full_pipeline_low_confidence_escalates() {
    init_tracing();
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let frame = FrameId::new(4004);

    // Evidence arrives out of order; context last.
    core.submit_evidence(frame, ball_contact(true), 97.0).unwrap();
    core.submit_evidence(frame, pose(HandPosition::Unnatural), 94.5)
        .unwrap();
    let ack = core
        .submit_evidence(frame, context(Intent::Intentional, true), 92.5)
        .unwrap();

    let EvidenceAck::Fused { ruling, .. } = ack else {
        panic!("expected fusion on the completing submission, got {ack:?}");
    };
    assert_eq!(ruling.verdict, Verdict::HandballPenalty);
    assert_eq!(ruling.confidence.value(), 92.5);
    assert!(ruling.requires_review);
    assert!(!ruling.var_reviewed);

    // The escalated proposal is still recorded for the reviewer.
    let recorded = core.get_decision(frame).unwrap();
    assert_eq!(recorded.verdict, Verdict::HandballPenalty);
}

#[test]
fn full_pipeline_high_confidence_is_final() {
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let frame = FrameId::new(4005);

    core.submit_evidence(frame, pose(HandPosition::Unnatural), 96.5)
        .unwrap();
    core.submit_evidence(frame, ball_contact(true), 97.0).unwrap();
    core.submit_evidence(frame, context(Intent::Intentional, true), 96.0)
        .unwrap();

    let ruling = core.get_decision(frame).unwrap();
    assert_eq!(ruling.confidence.value(), 96.0);
    assert!(!ruling.requires_review);

    // Final rulings distribute without the provisional flag.
    let report = core.distribute_decision(frame, false).unwrap();
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.all_delivered());
}

#[test]
fn concurrent_sources_fuse_exactly_once() {
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let frame = FrameId::new(77);

    let payloads = [
        (pose(HandPosition::Unnatural), 94.5),
        (ball_contact(true), 97.0),
        (context(Intent::Intentional, true), 92.5),
    ];

    let mut handles = Vec::new();
    for (payload, certainty) in payloads {
        let core = core.clone();
        handles.push(thread::spawn(move || {
            core.submit_evidence(frame, payload, certainty).unwrap()
        }));
    }

    let fused = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ack| matches!(ack, EvidenceAck::Fused { .. }))
        .count();
    assert_eq!(fused, 1);

    // Exactly one ledger entry for the frame.
    let entries: Vec<LedgerEntry> = core.list_decisions().unwrap();
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.ruling.frame_id == frame)
            .count(),
        1
    );
}

#[test]
fn override_appends_and_wins() {
    init_tracing();
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let frame = FrameId::new(1024);

    core.submit_evidence(frame, pose(HandPosition::Unnatural), 94.5)
        .unwrap();
    core.submit_evidence(frame, ball_contact(true), 97.0).unwrap();
    core.submit_evidence(frame, context(Intent::Intentional, true), 92.5)
        .unwrap();

    // The review collaborator submits its verdict as console text.
    let verdict: Verdict = "No Handball".parse().unwrap();
    let overridden = core
        .override_decision(frame, verdict, Some("ball struck the chest first".to_string()))
        .unwrap();
    assert_eq!(overridden.verdict, Verdict::NoHandball);
    assert!(overridden.var_reviewed);

    // get_decision serves the override, never the original fusion result.
    let decision = core.get_decision(frame).unwrap();
    assert_eq!(decision.verdict, Verdict::NoHandball);
    assert!(decision.var_reviewed);

    // The ledger keeps both entries for the frame, in order.
    let entries = core.list_decisions().unwrap();
    let frame_entries: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.ruling.frame_id == frame)
        .collect();
    assert_eq!(frame_entries.len(), 2);
    assert_eq!(frame_entries[0].ruling.verdict, Verdict::HandballPenalty);
    assert_eq!(frame_entries[1].ruling.verdict, Verdict::NoHandball);
}

#[test]
fn ledger_order_is_append_order_across_overrides() {
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();

    for frame in [3u64, 1, 2] {
        let frame_id = FrameId::new(frame);
        core.submit_evidence(frame_id, pose(HandPosition::Natural), 90.0)
            .unwrap();
        core.submit_evidence(frame_id, ball_contact(false), 90.0)
            .unwrap();
        core.submit_evidence(frame_id, context(Intent::Accidental, false), 90.0)
            .unwrap();
    }
    core.override_decision(FrameId::new(1), Verdict::HandballNoSanction, None)
        .unwrap();

    let ids: Vec<u64> = core
        .list_decisions()
        .unwrap()
        .iter()
        .map(|e| e.id.value())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    let frames: Vec<u64> = core
        .list_decisions()
        .unwrap()
        .iter()
        .map(|e| e.ruling.frame_id.value())
        .collect();
    assert_eq!(frames, vec![3, 1, 2, 1]);
}

#[test]
fn override_of_unknown_frame_is_structured_failure() {
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let err = core
        .override_decision(FrameId::new(9999), Verdict::NoHandball, None)
        .unwrap_err();
    assert!(err.is_not_found());

    // The core stays available for subsequent frames.
    let frame = FrameId::new(10_000);
    core.submit_evidence(frame, pose(HandPosition::Natural), 99.0)
        .unwrap();
    core.submit_evidence(frame, ball_contact(false), 99.0).unwrap();
    core.submit_evidence(frame, context(Intent::Accidental, false), 99.0)
        .unwrap();
    assert!(core.get_decision(frame).is_ok());
}

#[test]
fn provisional_distribution_requires_acknowledgement() {
    let core = DecisionCore::in_memory(CoreConfig::default()).unwrap();
    let frame = FrameId::new(55);

    core.submit_evidence(frame, pose(HandPosition::Unnatural), 80.0)
        .unwrap();
    core.submit_evidence(frame, ball_contact(true), 97.0).unwrap();
    core.submit_evidence(frame, context(Intent::Intentional, true), 96.0)
        .unwrap();

    // Below threshold and unreviewed: the caller must acknowledge.
    assert!(core.distribute_decision(frame, false).is_err());
    let report = core.distribute_decision(frame, true).unwrap();
    assert!(report.provisional);

    // After review the flag is no longer needed.
    core.override_decision(frame, Verdict::HandballPenalty, None)
        .unwrap();
    let report = core.distribute_decision(frame, false).unwrap();
    assert!(!report.provisional);
    assert!(report.all_delivered());
}

#[test]
fn partial_delivery_failure_reports_all_targets() {
    struct DeadUplink;
    impl DeliveryTarget for DeadUplink {
        fn name(&self) -> &str {
            "stadium-board"
        }
        fn deliver(&self, _entry: &LedgerEntry) -> Result<(), DeliveryFault> {
            Err(DeliveryFault::new("link down"))
        }
    }

    let ledger = Arc::new(InMemoryDecisionStore::new());
    let targets: Vec<Arc<dyn DeliveryTarget>> = vec![
        Arc::new(LogTarget::new("referee-smartwatch").unwrap()),
        Arc::new(DeadUplink),
        Arc::new(LogTarget::new("tv-broadcast").unwrap()),
        Arc::new(LogTarget::new("cloud-archive").unwrap()),
    ];
    let mut config = CoreConfig::default();
    config.delivery_timeout = Duration::from_millis(500);
    let core = DecisionCore::with_parts(config, ledger, None, Some(targets)).unwrap();

    let frame = FrameId::new(66);
    core.submit_evidence(frame, pose(HandPosition::Natural), 99.0)
        .unwrap();
    core.submit_evidence(frame, ball_contact(false), 99.0).unwrap();
    core.submit_evidence(frame, context(Intent::Accidental, false), 99.0)
        .unwrap();

    let report = core.distribute_decision(frame, false).unwrap();
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.delivered_count(), 3);

    let failed: Vec<&str> = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, DeliveryStatus::Failed { .. }))
        .map(|o| o.target.as_str())
        .collect();
    assert_eq!(failed, vec!["stadium-board"]);
}
