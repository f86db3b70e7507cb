//! # Property-Based Tests
//!
//! Verification tests using proptest.
//!
//! These tests ensure determinism and the booking invariants: single
//! assignment, monotone status, and integer-only scoring.

use ednova_core::{
    Assessment, EdnovaError, Lifecycle, MemoryStore, RecordStore, Role, SessionId, SkillLevel,
    Timestamp, User, UserId,
};
use proptest::collection::vec;
use proptest::prelude::*;

const NOW: Timestamp = Timestamp::from_unix(1_700_000_000);

fn seeded_store(host_id: u128, student_ids: &[u128]) -> (MemoryStore, User, Vec<User>) {
    let mut store = MemoryStore::new();
    let mut host = User::new(UserId::from_u128(host_id), "host", Role::Teacher);
    host.skill_level = Some(SkillLevel::Advanced);
    store.insert_user(&host).unwrap();
    let students: Vec<User> = student_ids
        .iter()
        .map(|&n| {
            let user = User::new(UserId::from_u128(n), format!("s-{n}"), Role::Student);
            store.insert_user(&user).unwrap();
            user
        })
        .collect();
    (store, host, students)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Of any sequence of competing booking claims, exactly one succeeds
    /// and every later claim observes a conflict, regardless of order.
    #[test]
    fn booking_is_single_assignment(
        student_ids in vec(2u128..10_000, 1..20)
    ) {
        let mut unique = student_ids.clone();
        unique.sort_unstable();
        unique.dedup();

        let (mut store, host, students) = seeded_store(1, &unique);
        let session = Lifecycle::create_session(
            &mut store,
            &host,
            SessionId::from_u128(77),
            "Contested",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        ).unwrap();

        let mut winners = 0usize;
        let mut conflicts = 0usize;
        for student in &students {
            match Lifecycle::book(&mut store, session.id, student) {
                Ok(_) => winners += 1,
                Err(EdnovaError::Conflict(_)) => conflicts += 1,
                Err(other) => return Err(TestCaseError::fail(format!("unexpected: {other}"))),
            }
        }
        prop_assert_eq!(winners, 1);
        prop_assert_eq!(conflicts, students.len() - 1);

        // The winner is the first claimant; losers changed nothing.
        let stored = store.session(session.id).unwrap().unwrap();
        prop_assert_eq!(stored.student, Some(students[0].id));
    }

    /// Status never leaves a terminal state: whatever terminal transition
    /// lands first, every later transition fails and the status sticks.
    #[test]
    fn status_is_monotone(
        first_cancel in any::<bool>(),
        attempts in vec(any::<bool>(), 1..10)
    ) {
        let (mut store, host, _) = seeded_store(1, &[]);
        let session = Lifecycle::create_session(
            &mut store,
            &host,
            SessionId::from_u128(77),
            "Terminal",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        ).unwrap();

        let settled = if first_cancel {
            Lifecycle::cancel(&mut store, session.id, &host).unwrap()
        } else {
            Lifecycle::complete(&mut store, session.id, &host).unwrap()
        };
        prop_assert!(settled.status.is_terminal());

        for cancel in attempts {
            let result = if cancel {
                Lifecycle::cancel(&mut store, session.id, &host)
            } else {
                Lifecycle::complete(&mut store, session.id, &host)
            };
            prop_assert!(matches!(result, Err(EdnovaError::State(_))));
            let current = store.session(session.id).unwrap().unwrap();
            prop_assert_eq!(current.status, settled.status);
        }
    }

    /// The join window decision depends only on the signed distance to the
    /// start time: admitted iff at most fifteen minutes early.
    #[test]
    fn join_window_matches_signed_distance(offset in -100_000i64..100_000) {
        let (mut store, host, _) = seeded_store(1, &[]);
        let start = NOW.plus_seconds(200_000);
        let session = Lifecycle::create_session(
            &mut store,
            &host,
            SessionId::from_u128(77),
            "Windowed",
            "",
            start,
            60,
            NOW,
        ).unwrap();

        let arrival = start.plus_seconds(offset);
        let verdict = Lifecycle::can_join(&session, host.id, arrival);
        prop_assert_eq!(verdict.is_admitted(), offset >= -900);
    }

    /// Scoring is deterministic, always in 0..=100, and classification
    /// respects the two thresholds.
    #[test]
    fn scoring_is_deterministic_and_bounded(
        answers in vec(0usize..6, 8)
    ) {
        let first = Assessment::score(&answers).unwrap();
        let second = Assessment::score(&answers).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first <= 100);

        let level = Assessment::classify(first);
        match level {
            SkillLevel::Advanced => prop_assert!(first >= 80),
            SkillLevel::Intermediate => prop_assert!((50..80).contains(&first)),
            SkillLevel::Basic => prop_assert!(first < 50),
        }
    }

    /// Wrong-sized answer sheets are always rejected before scoring.
    #[test]
    fn partial_sheets_are_rejected(
        answers in vec(0usize..4, 0..20).prop_filter("wrong size", |v| v.len() != 8)
    ) {
        let result = Assessment::score(&answers);
        let is_incomplete = matches!(result, Err(EdnovaError::Incomplete { .. }));
        prop_assert!(is_incomplete);
    }

    /// Listing order is a pure function of (scheduled_time, id), not of
    /// insertion order.
    #[test]
    fn listing_order_ignores_insertion_order(
        offsets in vec(1i64..100_000, 1..20)
    ) {
        let mut ordered = offsets.clone();
        ordered.sort_unstable();
        ordered.dedup();

        let (mut store, host, _) = seeded_store(1, &[]);
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        for (i, offset) in shuffled.iter().enumerate() {
            Lifecycle::create_session(
                &mut store,
                &host,
                SessionId::from_u128(100 + i as u128),
                "Ordered",
                "",
                NOW.plus_seconds(*offset),
                60,
                NOW,
            ).unwrap();
        }

        let listed: Vec<i64> = store
            .sessions_by_time()
            .unwrap()
            .iter()
            .map(|s| s.scheduled_time.value() - NOW.value())
            .collect();
        prop_assert_eq!(listed, ordered);
    }
}
