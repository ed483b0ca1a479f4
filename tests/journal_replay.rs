//! Durability tests for the JSON-lines decision journal.

#![cfg(feature = "persistent")]

use std::sync::Arc;

use varcore::{
    CoreConfig, DecisionCore, EvidencePayload, FrameId, HandPosition, Intent,
    JournalDecisionStore, Verdict,
};

fn submit_penalty_frame(core: &DecisionCore, frame: u64) {
    let frame_id = FrameId::new(frame);
    core.submit_evidence(
        frame_id,
        EvidencePayload::Pose {
            hand_position: HandPosition::Unnatural,
            limb_angles: Default::default(),
        },
        94.5,
    )
    .unwrap();
    core.submit_evidence(
        frame_id,
        EvidencePayload::BallContact {
            contact: true,
            impact_force: 3.2,
            contact_duration: 0.04,
            sensor_source: None,
        },
        97.0,
    )
    .unwrap();
    core.submit_evidence(
        frame_id,
        EvidencePayload::Context {
            intent: Intent::Intentional,
            rule_violation: true,
        },
        92.5,
    )
    .unwrap();
}

#[test]
fn journal_survives_restart_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decisions.jsonl");

    {
        let ledger = Arc::new(JournalDecisionStore::open(&path).unwrap());
        let core = DecisionCore::new(CoreConfig::default(), ledger).unwrap();

        submit_penalty_frame(&core, 1024);
        submit_penalty_frame(&core, 1025);
        core.override_decision(FrameId::new(1024), Verdict::NoHandball, Some("VAR".into()))
            .unwrap();
    }

    // Fresh process: replay the journal into a new core.
    let ledger = Arc::new(JournalDecisionStore::open(&path).unwrap());
    let core = DecisionCore::new(CoreConfig::default(), ledger).unwrap();

    let entries = core.list_decisions().unwrap();
    assert_eq!(entries.len(), 3);

    let decision = core.get_decision(FrameId::new(1024)).unwrap();
    assert_eq!(decision.verdict, Verdict::NoHandball);
    assert!(decision.var_reviewed);

    let untouched = core.get_decision(FrameId::new(1025)).unwrap();
    assert_eq!(untouched.verdict, Verdict::HandballPenalty);

    // The single-override policy holds across restarts.
    let err = core
        .override_decision(FrameId::new(1024), Verdict::HandballPenalty, None)
        .unwrap_err();
    assert!(!err.is_not_found());
}

#[test]
fn replayed_ledger_keeps_append_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decisions.jsonl");

    {
        let ledger = Arc::new(JournalDecisionStore::open(&path).unwrap());
        let core = DecisionCore::new(CoreConfig::default(), ledger).unwrap();
        for frame in [9u64, 4, 6] {
            submit_penalty_frame(&core, frame);
        }
    }

    let ledger = JournalDecisionStore::open(&path).unwrap();
    let frames: Vec<u64> = varcore::DecisionStore::list(&ledger)
        .unwrap()
        .iter()
        .map(|e| e.ruling.frame_id.value())
        .collect();
    assert_eq!(frames, vec![9, 4, 6]);
}
