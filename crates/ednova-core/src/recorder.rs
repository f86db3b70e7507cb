//! # Feedback & Notes Recorder
//!
//! Records post-session feedback and session notes, and aggregates a
//! teacher's received ratings.
//!
//! Feedback is immutable and unique per (session, student); the uniqueness
//! check lives in the store so the check and the write are one atomic step.
//! Notes are append-only and visible to participants only. Rating averages
//! are integer centi-ratings; the core does no float arithmetic.

use crate::access::{AccessGate, Capability};
use crate::primitives::{MAX_COMMENT_LENGTH, MAX_NOTE_LENGTH, RATING_MAX, RATING_MIN};
use crate::records::RecordStore;
use crate::types::{
    EdnovaError, Feedback, Note, NoteId, SessionId, SessionStatus, Timestamp, User, UserId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// RATING SUMMARY
// =============================================================================

/// Aggregated ratings received by one teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of feedback records aggregated.
    pub count: usize,
    /// Mean rating scaled by 100, truncating. 450 reads as 4.50. Zero when
    /// no feedback exists.
    pub average_centi: u64,
}

impl RatingSummary {
    fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                count: 0,
                average_centi: 0,
            };
        }
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        Self {
            count: ratings.len(),
            average_centi: sum * 100 / ratings.len() as u64,
        }
    }
}

// =============================================================================
// RECORDER ENGINE
// =============================================================================

/// The feedback and notes recorder.
pub struct Recorder;

impl Recorder {
    /// Record feedback from the booked student of a completed session.
    ///
    /// The session must be completed, the caller must be its booked
    /// student, and the rating must lie in `RATING_MIN..=RATING_MAX`.
    /// The comment is trimmed and dropped when empty. A second submission
    /// for the same session fails with `Conflict`.
    pub fn submit_feedback(
        store: &mut impl RecordStore,
        session_id: SessionId,
        student: &User,
        rating: u8,
        comment: Option<&str>,
        now: Timestamp,
    ) -> Result<Feedback, EdnovaError> {
        let session = store
            .session(session_id)?
            .ok_or(EdnovaError::SessionNotFound(session_id))?;
        AccessGate::require(Some(student), Some(&session), Capability::SubmitFeedback)?;
        if session.status != SessionStatus::Completed {
            return Err(EdnovaError::State(session.status));
        }
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(EdnovaError::Validation(format!(
                "Rating must be between {RATING_MIN} and {RATING_MAX}"
            )));
        }
        let comment = match comment.map(str::trim) {
            None | Some("") => None,
            Some(c) if c.len() > MAX_COMMENT_LENGTH => {
                return Err(EdnovaError::Validation(format!(
                    "Comment exceeds {MAX_COMMENT_LENGTH} characters"
                )));
            }
            Some(c) => Some(c.to_string()),
        };

        let feedback = Feedback::new(
            session_id,
            student.id,
            session.host,
            rating,
            comment,
            now,
        );
        store.insert_feedback(&feedback)?;
        Ok(feedback)
    }

    /// Append a note to a session. Participants only; content is trimmed
    /// and must be non-empty.
    pub fn add_note(
        store: &mut impl RecordStore,
        id: NoteId,
        session_id: SessionId,
        author: &User,
        content: &str,
        now: Timestamp,
    ) -> Result<Note, EdnovaError> {
        let session = store
            .session(session_id)?
            .ok_or(EdnovaError::SessionNotFound(session_id))?;
        AccessGate::require(Some(author), Some(&session), Capability::AddNote)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(EdnovaError::Validation("Note must not be empty".into()));
        }
        if content.len() > MAX_NOTE_LENGTH {
            return Err(EdnovaError::Validation(format!(
                "Note exceeds {MAX_NOTE_LENGTH} characters"
            )));
        }

        let note = Note::new(id, session_id, author.id, content, now);
        store.insert_note(&note)?;
        Ok(note)
    }

    /// All notes of a session in append order. Participants only; notes are
    /// never public.
    pub fn notes(
        store: &impl RecordStore,
        session_id: SessionId,
        principal: &User,
    ) -> Result<Vec<Note>, EdnovaError> {
        let session = store
            .session(session_id)?
            .ok_or(EdnovaError::SessionNotFound(session_id))?;
        if !session.is_participant(principal.id) {
            return Err(EdnovaError::NotAuthorized);
        }
        store.notes_for_session(session_id)
    }

    /// All feedback received by a teacher, newest first.
    pub fn feedback_for_teacher(
        store: &impl RecordStore,
        teacher: UserId,
    ) -> Result<Vec<Feedback>, EdnovaError> {
        store.feedback_for_teacher(teacher)
    }

    /// Aggregate a teacher's received ratings.
    pub fn rating_summary(
        store: &impl RecordStore,
        teacher: UserId,
    ) -> Result<RatingSummary, EdnovaError> {
        let ratings: Vec<u8> = store
            .feedback_for_teacher(teacher)?
            .iter()
            .map(|f| f.rating)
            .collect();
        Ok(RatingSummary::from_ratings(&ratings))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::records::{MemoryStore, RecordStore};
    use crate::types::{Role, Session, SkillLevel, UserId};

    const NOW: Timestamp = Timestamp::from_unix(1_700_000_000);

    struct Fixture {
        store: MemoryStore,
        host: User,
        booked: User,
        session: Session,
    }

    /// A completed session with `booked` as the student.
    fn completed_session() -> Fixture {
        let mut store = MemoryStore::new();
        let mut host = User::new(UserId::from_u128(1), "pat", Role::Teacher);
        host.skill_level = Some(SkillLevel::Advanced);
        store.insert_user(&host).unwrap();
        let booked = User::new(UserId::from_u128(2), "sam", Role::Student);
        store.insert_user(&booked).unwrap();

        let session = Lifecycle::create_session(
            &mut store,
            &host,
            crate::types::SessionId::from_u128(10),
            "Algebra",
            "",
            NOW.plus_seconds(3600),
            60,
            NOW,
        )
        .unwrap();
        Lifecycle::book(&mut store, session.id, &booked).unwrap();
        let session = Lifecycle::complete(&mut store, session.id, &booked).unwrap();
        Fixture {
            store,
            host,
            booked,
            session,
        }
    }

    #[test]
    fn feedback_happy_path_and_uniqueness() {
        let mut f = completed_session();
        let feedback = Recorder::submit_feedback(
            &mut f.store,
            f.session.id,
            &f.booked,
            5,
            Some("  Great session  "),
            NOW.plus_seconds(7200),
        )
        .unwrap();
        assert_eq!(feedback.teacher, f.host.id);
        assert_eq!(feedback.comment.as_deref(), Some("Great session"));

        let err = Recorder::submit_feedback(
            &mut f.store,
            f.session.id,
            &f.booked,
            4,
            None,
            NOW.plus_seconds(7300),
        )
        .unwrap_err();
        assert!(matches!(err, EdnovaError::Conflict(_)));
    }

    #[test]
    fn feedback_requires_completed_session() {
        let mut f = completed_session();
        // Build a second, still-scheduled booked session.
        let open = Lifecycle::create_session(
            &mut f.store,
            &f.host,
            crate::types::SessionId::from_u128(11),
            "Geometry",
            "",
            NOW.plus_seconds(7200),
            60,
            NOW,
        )
        .unwrap();
        Lifecycle::book(&mut f.store, open.id, &f.booked).unwrap();

        let err =
            Recorder::submit_feedback(&mut f.store, open.id, &f.booked, 5, None, NOW).unwrap_err();
        assert!(matches!(err, EdnovaError::State(SessionStatus::Scheduled)));
    }

    #[test]
    fn feedback_is_booked_student_only() {
        let mut f = completed_session();
        let stranger = User::new(UserId::from_u128(9), "kim", Role::Student);
        f.store.insert_user(&stranger).unwrap();

        let err = Recorder::submit_feedback(&mut f.store, f.session.id, &stranger, 5, None, NOW)
            .unwrap_err();
        assert!(matches!(err, EdnovaError::NotAuthorized));

        // The host cannot rate their own session either.
        let err = Recorder::submit_feedback(&mut f.store, f.session.id, &f.host, 5, None, NOW)
            .unwrap_err();
        assert!(matches!(err, EdnovaError::NotAuthorized));
    }

    #[test]
    fn rating_bounds_and_empty_comment() {
        let mut f = completed_session();
        for rating in [0, 6] {
            let err =
                Recorder::submit_feedback(&mut f.store, f.session.id, &f.booked, rating, None, NOW)
                    .unwrap_err();
            assert!(matches!(err, EdnovaError::Validation(_)));
        }
        let feedback =
            Recorder::submit_feedback(&mut f.store, f.session.id, &f.booked, 3, Some("   "), NOW)
                .unwrap();
        assert_eq!(feedback.comment, None);
    }

    #[test]
    fn notes_are_participant_scoped_and_ordered() {
        let mut f = completed_session();
        let first = Recorder::add_note(
            &mut f.store,
            NoteId::from_u128(100),
            f.session.id,
            &f.host,
            "Covered chapters 1-3",
            NOW,
        )
        .unwrap();
        let second = Recorder::add_note(
            &mut f.store,
            NoteId::from_u128(101),
            f.session.id,
            &f.booked,
            "Homework: exercises 4 and 5",
            NOW.plus_seconds(60),
        )
        .unwrap();

        let notes = Recorder::notes(&f.store, f.session.id, &f.host).unwrap();
        assert_eq!(notes, vec![first, second]);

        let stranger = User::new(UserId::from_u128(9), "kim", Role::Student);
        let err = Recorder::notes(&f.store, f.session.id, &stranger).unwrap_err();
        assert!(matches!(err, EdnovaError::NotAuthorized));

        let err = Recorder::add_note(
            &mut f.store,
            NoteId::from_u128(102),
            f.session.id,
            &stranger,
            "hi",
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, EdnovaError::NotAuthorized));

        let err = Recorder::add_note(
            &mut f.store,
            NoteId::from_u128(103),
            f.session.id,
            &f.host,
            "   ",
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, EdnovaError::Validation(_)));
    }

    #[test]
    fn rating_summary_truncates_to_centi() {
        let mut f = completed_session();
        Recorder::submit_feedback(&mut f.store, f.session.id, &f.booked, 4, None, NOW).unwrap();

        // Second completed session with another student, rated 5.
        let other = User::new(UserId::from_u128(3), "ada", Role::Student);
        f.store.insert_user(&other).unwrap();
        let s2 = Lifecycle::create_session(
            &mut f.store,
            &f.host,
            crate::types::SessionId::from_u128(11),
            "Geometry",
            "",
            NOW.plus_seconds(7200),
            60,
            NOW,
        )
        .unwrap();
        Lifecycle::book(&mut f.store, s2.id, &other).unwrap();
        Lifecycle::complete(&mut f.store, s2.id, &other).unwrap();
        Recorder::submit_feedback(&mut f.store, s2.id, &other, 5, None, NOW.plus_seconds(1))
            .unwrap();

        let summary = Recorder::rating_summary(&f.store, f.host.id).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_centi, 450);

        let empty = Recorder::rating_summary(&f.store, UserId::from_u128(99)).unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average_centi, 0);
    }

    #[test]
    fn feedback_for_missing_session_is_not_found() {
        let mut f = completed_session();
        let ghost = crate::types::SessionId::from_u128(404);
        let err =
            Recorder::submit_feedback(&mut f.store, ghost, &f.booked, 5, None, NOW).unwrap_err();
        assert!(matches!(err, EdnovaError::SessionNotFound(_)));
    }
}
