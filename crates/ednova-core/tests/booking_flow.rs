//! # Booking Flow Tests
//!
//! End-to-end lifecycle scenarios driven through the [`Registry`] facade,
//! exercised against both storage backends.

use ednova_core::{
    EdnovaError, NoteId, Registry, Role, SessionId, SessionStatus, SkillLevel, Timestamp, User,
    UserId,
};
use tempfile::TempDir;

const NOW: Timestamp = Timestamp::from_unix(1_700_000_000);

fn perfect_answers() -> Vec<usize> {
    vec![1, 3, 2, 1, 2, 2, 2, 2]
}

fn seed_teacher(registry: &mut Registry, n: u128, name: &str) -> UserId {
    let user = User::new(UserId::from_u128(n), name, Role::Teacher);
    registry.register_user(&user).unwrap();
    let result = registry
        .submit_assessment(user.id, &perfect_answers(), NOW)
        .unwrap();
    assert_eq!(result.level, SkillLevel::Advanced);
    user.id
}

fn seed_student(registry: &mut Registry, n: u128, name: &str) -> UserId {
    let user = User::new(UserId::from_u128(n), name, Role::Student);
    registry.register_user(&user).unwrap();
    user.id
}

/// The reference scenario: an assessed teacher schedules a session an hour
/// out, one of two students wins the booking race, the participants join
/// inside the window, the session completes, and the student leaves
/// five-star feedback exactly once.
fn full_lifecycle(registry: &mut Registry) {
    let host = seed_teacher(registry, 1, "Grace");
    let alice = seed_student(registry, 2, "Alice");
    let bob = seed_student(registry, 3, "Bob");

    let start = NOW.plus_seconds(3600);
    let session = registry
        .create_session(
            host,
            SessionId::from_u128(10),
            "Rust ownership",
            "Borrowing, lifetimes, and the borrow checker",
            start,
            90,
            NOW,
        )
        .unwrap();
    assert_eq!(session.status, SessionStatus::Scheduled);
    assert!(session.room.as_str().contains("meet.jit.si/ednova-"));

    // Alice wins the slot; Bob loses the race.
    registry.book(session.id, alice).unwrap();
    let err = registry.book(session.id, bob).unwrap_err();
    assert!(matches!(err, EdnovaError::Conflict(_)));

    // Ten minutes before start both participants are admitted, Bob is not.
    let at_door = start.plus_seconds(-600);
    let (verdict, room) = registry.join(session.id, alice, at_door).unwrap();
    assert!(verdict.is_admitted());
    assert_eq!(room.as_ref(), Some(&session.room));
    assert!(
        registry
            .join(session.id, host, at_door)
            .unwrap()
            .0
            .is_admitted()
    );
    let (verdict, room) = registry.join(session.id, bob, at_door).unwrap();
    assert!(!verdict.is_admitted());
    assert!(room.is_none());

    // Completion is terminal and unlocks feedback.
    registry.complete(session.id, alice).unwrap();
    let feedback = registry
        .submit_feedback(
            session.id,
            alice,
            5,
            Some("Finally understood lifetimes"),
            start.plus_seconds(5400),
        )
        .unwrap();
    assert_eq!(feedback.teacher, host);

    let err = registry
        .submit_feedback(session.id, alice, 4, None, start.plus_seconds(5500))
        .unwrap_err();
    assert!(matches!(err, EdnovaError::Conflict(_)));

    let summary = registry.rating_summary(host).unwrap();
    assert_eq!((summary.count, summary.average_centi), (1, 500));

    // Notes are participant-scoped.
    registry
        .add_note(
            NoteId::from_u128(100),
            session.id,
            host,
            "Covered chapters 4 and 10",
            start.plus_seconds(5400),
        )
        .unwrap();
    assert_eq!(registry.notes(session.id, alice).unwrap().len(), 1);
    let err = registry.notes(session.id, bob).unwrap_err();
    assert!(matches!(err, EdnovaError::NotAuthorized));
}

#[test]
fn full_lifecycle_in_memory() {
    let mut registry = Registry::new();
    full_lifecycle(&mut registry);
}

#[test]
fn full_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let mut registry = Registry::with_redb(dir.path().join("flow.redb")).unwrap();
    full_lifecycle(&mut registry);
}

#[test]
fn lifecycle_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("restart.redb");
    let session_id = SessionId::from_u128(10);
    let (host, student);
    {
        let mut registry = Registry::with_redb(&path).unwrap();
        host = seed_teacher(&mut registry, 1, "Grace");
        student = seed_student(&mut registry, 2, "Alice");
        registry
            .create_session(
                host,
                session_id,
                "Rust ownership",
                "",
                NOW.plus_seconds(3600),
                60,
                NOW,
            )
            .unwrap();
        registry.book(session_id, student).unwrap();
    }

    // Reopen: the booking and the hosting grant are still there.
    let mut registry = Registry::with_redb(&path).unwrap();
    let session = registry.session(session_id).unwrap().unwrap();
    assert_eq!(session.student, Some(student));
    assert_eq!(
        registry.user(host).unwrap().unwrap().skill_level,
        Some(SkillLevel::Advanced)
    );

    registry.complete(session_id, host).unwrap();
    let err = registry.cancel(session_id, host).unwrap_err();
    assert!(matches!(err, EdnovaError::State(SessionStatus::Completed)));
}

#[test]
fn unassessed_teacher_is_gated_until_assessment() {
    let mut registry = Registry::new();
    let user = User::new(UserId::from_u128(1), "Pat", Role::Teacher);
    registry.register_user(&user).unwrap();

    let err = registry
        .create_session(
            user.id,
            SessionId::from_u128(10),
            "Too soon",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        )
        .unwrap_err();
    assert!(matches!(err, EdnovaError::Capability(_)));

    // Even an all-wrong sheet yields a level and unlocks hosting.
    let result = registry
        .submit_assessment(user.id, &vec![0; 8], NOW)
        .unwrap();
    assert_eq!(result.level, SkillLevel::Basic);

    registry
        .create_session(
            user.id,
            SessionId::from_u128(10),
            "Unlocked",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        )
        .unwrap();
}

#[test]
fn cancelled_sessions_stay_listed_until_pruned() {
    let mut registry = Registry::new();
    let host = seed_teacher(&mut registry, 1, "Grace");
    let session = registry
        .create_session(
            host,
            SessionId::from_u128(10),
            "Withdrawn",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        )
        .unwrap();
    registry.cancel(session.id, host).unwrap();

    // The record is retained with its terminal status.
    let listed = registry.sessions().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, SessionStatus::Cancelled);

    // Offline pruning is the only deletion path.
    assert_eq!(
        registry.prune_cancelled(NOW.plus_seconds(7200)).unwrap(),
        1
    );
    assert!(registry.sessions().unwrap().is_empty());
}
