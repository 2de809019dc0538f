//! End-to-end scenarios through the engine with in-memory collaborators.

use std::sync::Arc;

use rollcall_nullables::{NullClock, NullCredentialStore, NullLedger, NullRandom};
use rollcall_store::{AttendanceLedger, CredentialStore};
use rollcall_types::{Clock, Coordinate, Principal, StudentId, VerificationParams};
use rollcall_verification::{distance_km, Outcome, RejectReason, VerificationEngine};

const T0: u64 = 1_709_280_000; // 2024-03-01T08:00:00Z

struct Harness {
    engine: Arc<VerificationEngine>,
    ledger: Arc<NullLedger>,
    clock: NullClock,
    params: VerificationParams,
}

fn harness() -> Harness {
    let params = VerificationParams::default();
    let ledger = Arc::new(NullLedger::new());
    let engine = VerificationEngine::new(
        params.clone(),
        ledger.clone(),
        Arc::new(NullCredentialStore::new()),
        Arc::new(NullRandom::seeded(2024)),
    )
    .unwrap();
    Harness {
        engine: Arc::new(engine),
        ledger,
        clock: NullClock::new(T0),
        params,
    }
}

fn student(id: &str) -> Principal {
    Principal::new(StudentId::new(id).unwrap(), format!("Student {id}"))
}

/// A point `north_deg` degrees of latitude north of the authorized location.
fn north_of(params: &VerificationParams, north_deg: f64) -> Coordinate {
    let c = params.authorized_location;
    Coordinate::new(c.latitude + north_deg, c.longitude)
}

#[test]
fn scenario_1_scan_in_range_is_accepted() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();

    let sample = north_of(&h.params, 0.0027);
    let d = distance_km(h.params.authorized_location, sample).unwrap();
    assert!((d - 0.3).abs() < 0.01, "sample is {d} km away");

    h.clock.advance(100);
    let outcome = h
        .engine
        .verify_by_qr(&student("S1"), &token.payload, sample, h.clock.now())
        .unwrap();

    assert!(outcome.is_accepted(), "{outcome:?}");
    assert_eq!(outcome.message(), "Attendance marked successfully");
    assert_eq!(h.ledger.record_count().unwrap(), 1);
    let record = outcome.record().unwrap();
    assert_eq!(record.session.subject, "CS101");
    assert_eq!(record.session.period, "P1");
}

#[test]
fn scenario_2_scan_out_of_range_is_rejected() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();

    let sample = north_of(&h.params, 0.00724);
    let d = distance_km(h.params.authorized_location, sample).unwrap();
    assert!((d - 0.8).abs() < 0.01, "sample is {d} km away");

    h.clock.advance(100);
    let outcome = h
        .engine
        .verify_by_qr(&student("S1"), &token.payload, sample, h.clock.now())
        .unwrap();

    assert_eq!(outcome, Outcome::Rejected(RejectReason::OutOfRange));
    assert_eq!(outcome.message(), "Outside authorized location");
    assert_eq!(h.ledger.record_count().unwrap(), 0);
}

#[test]
fn scenario_3_stale_token_is_rejected() {
    let h = harness();
    assert_eq!(h.params.qr_ttl_secs, 600);
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();

    h.clock.advance(700);
    let outcome = h
        .engine
        .verify_by_qr(
            &student("S1"),
            &token.payload,
            h.params.authorized_location,
            h.clock.now(),
        )
        .unwrap();

    assert_eq!(outcome, Outcome::Rejected(RejectReason::TokenExpired));
    assert_eq!(h.ledger.record_count().unwrap(), 0);
}

#[test]
fn late_answers_survive_periodic_purges() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();
    let code = h.engine.request_otp(&student("S2"), h.clock.now()).unwrap();

    // Purge every minute, the way the node does, well past both windows.
    for _ in 0..15 {
        h.clock.advance(60);
        h.engine.purge(h.clock.now());
    }

    let scan = h
        .engine
        .verify_by_qr(
            &student("S1"),
            &token.payload,
            h.params.authorized_location,
            h.clock.now(),
        )
        .unwrap();
    assert_eq!(scan, Outcome::Rejected(RejectReason::TokenExpired));
    assert_eq!(scan.message(), "QR expired");

    let otp = h
        .engine
        .verify_by_otp(&student("S2"), &code, "CS101", "P1", h.clock.now())
        .unwrap();
    assert_eq!(otp, Outcome::Rejected(RejectReason::OtpExpired));
    assert_eq!(h.ledger.record_count().unwrap(), 0);
}

#[test]
fn scenario_4_otp_is_single_use() {
    let h = harness();
    let s1 = student("S1");
    let code = h.engine.request_otp(&s1, h.clock.now()).unwrap();
    assert_eq!(code.len(), 6);

    h.clock.advance(30);
    let first = h
        .engine
        .verify_by_otp(&s1, &code, "CS101", "P1", h.clock.now())
        .unwrap();
    assert!(first.is_accepted(), "{first:?}");
    assert_eq!(first.message(), "OTP verified. Attendance marked.");

    let second = h
        .engine
        .verify_by_otp(&s1, &code, "CS101", "P1", h.clock.now())
        .unwrap();
    assert_eq!(second, Outcome::Rejected(RejectReason::OtpUnknown));
    assert_eq!(h.ledger.record_count().unwrap(), 1);
}

#[test]
fn superseded_token_is_rejected_as_mismatch() {
    let h = harness();
    let old = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();
    h.clock.advance(60);
    let new = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();

    let at = h.params.authorized_location;
    let outcome = h
        .engine
        .verify_by_qr(&student("S1"), &old.payload, at, h.clock.now())
        .unwrap();
    assert_eq!(outcome, Outcome::Rejected(RejectReason::TokenMismatch));

    let outcome = h
        .engine
        .verify_by_qr(&student("S1"), &new.payload, at, h.clock.now())
        .unwrap();
    assert!(outcome.is_accepted());
}

#[test]
fn one_token_serves_the_whole_class() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();
    let at = h.params.authorized_location;
    for i in 0..30 {
        let outcome = h
            .engine
            .verify_by_qr(&student(&format!("S{i}")), &token.payload, at, h.clock.now())
            .unwrap();
        assert!(outcome.is_accepted());
    }
    assert_eq!(h.ledger.record_count().unwrap(), 30);
}

#[test]
fn repeat_scan_is_already_recorded() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();
    let at = h.params.authorized_location;
    let s1 = student("S1");

    assert!(h
        .engine
        .verify_by_qr(&s1, &token.payload, at, h.clock.now())
        .unwrap()
        .is_accepted());
    h.clock.advance(10);
    assert_eq!(
        h.engine
            .verify_by_qr(&s1, &token.payload, at, h.clock.now())
            .unwrap(),
        Outcome::Rejected(RejectReason::AlreadyRecorded)
    );

    // The OTP path is guarded by the same check.
    let code = h.engine.request_otp(&s1, h.clock.now()).unwrap();
    assert_eq!(
        h.engine
            .verify_by_otp(&s1, &code, "CS101", "P1", h.clock.now())
            .unwrap(),
        Outcome::Rejected(RejectReason::AlreadyRecorded)
    );
    assert_eq!(h.ledger.record_count().unwrap(), 1);
}

#[test]
fn concurrent_duplicate_scans_record_once() {
    let h = harness();
    let token = h
        .engine
        .issue_session_token("CS101", "P1", h.clock.now())
        .unwrap();
    let at = h.params.authorized_location;
    let now = h.clock.now();
    let s1 = student("S1");

    let outcomes: Vec<Outcome> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                s.spawn(|| {
                    h.engine
                        .verify_by_qr(&s1, &token.payload, at, now)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });

    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| o.reason() == Some(RejectReason::AlreadyRecorded))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(h.ledger.record_count().unwrap(), 1);
}

#[test]
fn authenticate_delegates_to_credential_store() {
    let credentials = Arc::new(NullCredentialStore::new());
    credentials
        .add_student(&StudentId::new("21CS042").unwrap(), "Asha", "pw")
        .unwrap();
    let engine = VerificationEngine::new(
        VerificationParams::default(),
        Arc::new(NullLedger::new()),
        credentials,
        Arc::new(NullRandom::default()),
    )
    .unwrap();

    assert_eq!(engine.authenticate("21CS042", "pw").unwrap().name, "Asha");
    assert!(engine.authenticate("21CS042", "nope").is_err());
    assert!(engine.authenticate("not a valid id", "pw").is_err());
}
