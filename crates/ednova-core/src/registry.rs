//! # Registry
//!
//! The top-level facade over the booking engines and the record store.
//!
//! A [`Registry`] owns one [`StoreBackend`] and exposes every operation the
//! platform offers: registration, session lifecycle, feedback, notes, and
//! assessments. The engines themselves are stateless; the registry binds
//! them to the chosen backend and resolves principals by identifier so
//! callers work with plain ids.
//!
//! The registry still performs no clock reads; time-gated operations take
//! the caller's `now`.

use crate::assessment::Assessment;
use crate::lifecycle::{JoinVerdict, Lifecycle};
use crate::primitives::MAX_NAME_LENGTH;
use crate::recorder::{RatingSummary, Recorder};
use crate::records::{MemoryStore, RecordStore};
use crate::storage::RedbStore;
use crate::types::{
    EdnovaError, Feedback, Note, NoteId, RoomRef, Session, SessionId, SessionStatus,
    SkillTestResult, Timestamp, User, UserId,
};
use std::path::Path;

// =============================================================================
// STORE BACKEND
// =============================================================================

/// Storage backend for a registry.
///
/// - `InMemory`: fast, volatile, useful for tests and ephemeral servers
/// - `Persistent`: disk-backed via redb, survives restarts
#[derive(Debug)]
pub enum StoreBackend {
    /// In-memory storage (volatile).
    InMemory(MemoryStore),
    /// Disk-backed storage (persistent).
    Persistent(RedbStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::InMemory(MemoryStore::new())
    }
}

impl RecordStore for StoreBackend {
    fn insert_user(&mut self, user: &User) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.insert_user(user),
            StoreBackend::Persistent(s) => s.insert_user(user),
        }
    }

    fn user(&self, id: UserId) -> Result<Option<User>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.user(id),
            StoreBackend::Persistent(s) => s.user(id),
        }
    }

    fn set_skill_level(
        &mut self,
        id: UserId,
        level: crate::types::SkillLevel,
    ) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.set_skill_level(id, level),
            StoreBackend::Persistent(s) => s.set_skill_level(id, level),
        }
    }

    fn insert_session(&mut self, session: &Session) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.insert_session(session),
            StoreBackend::Persistent(s) => s.insert_session(session),
        }
    }

    fn session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.session(id),
            StoreBackend::Persistent(s) => s.session(id),
        }
    }

    fn sessions_by_time(&self) -> Result<Vec<Session>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.sessions_by_time(),
            StoreBackend::Persistent(s) => s.sessions_by_time(),
        }
    }

    fn sessions_for_user(&self, user: UserId) -> Result<Vec<Session>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.sessions_for_user(user),
            StoreBackend::Persistent(s) => s.sessions_for_user(user),
        }
    }

    fn claim_student(&mut self, id: SessionId, student: UserId) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.claim_student(id, student),
            StoreBackend::Persistent(s) => s.claim_student(id, student),
        }
    }

    fn transition_status(&mut self, id: SessionId, to: SessionStatus) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.transition_status(id, to),
            StoreBackend::Persistent(s) => s.transition_status(id, to),
        }
    }

    fn remove_session(&mut self, id: SessionId) -> Result<bool, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.remove_session(id),
            StoreBackend::Persistent(s) => s.remove_session(id),
        }
    }

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.insert_feedback(feedback),
            StoreBackend::Persistent(s) => s.insert_feedback(feedback),
        }
    }

    fn feedback_for_teacher(&self, teacher: UserId) -> Result<Vec<Feedback>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.feedback_for_teacher(teacher),
            StoreBackend::Persistent(s) => s.feedback_for_teacher(teacher),
        }
    }

    fn insert_note(&mut self, note: &Note) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.insert_note(note),
            StoreBackend::Persistent(s) => s.insert_note(note),
        }
    }

    fn notes_for_session(&self, id: SessionId) -> Result<Vec<Note>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.notes_for_session(id),
            StoreBackend::Persistent(s) => s.notes_for_session(id),
        }
    }

    fn insert_skill_result(&mut self, result: &SkillTestResult) -> Result<(), EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.insert_skill_result(result),
            StoreBackend::Persistent(s) => s.insert_skill_result(result),
        }
    }

    fn skill_results_for_user(&self, user: UserId) -> Result<Vec<SkillTestResult>, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.skill_results_for_user(user),
            StoreBackend::Persistent(s) => s.skill_results_for_user(user),
        }
    }

    fn user_count(&self) -> Result<usize, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.user_count(),
            StoreBackend::Persistent(s) => s.user_count(),
        }
    }

    fn session_count(&self) -> Result<usize, EdnovaError> {
        match self {
            StoreBackend::InMemory(s) => s.session_count(),
            StoreBackend::Persistent(s) => s.session_count(),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The booking platform facade.
#[derive(Debug, Default)]
pub struct Registry {
    store: StoreBackend,
}

impl Registry {
    /// Create a registry over volatile in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry over persistent redb storage at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, EdnovaError> {
        Ok(Self {
            store: StoreBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Whether the backend survives restarts.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.store, StoreBackend::Persistent(_))
    }

    fn require_user(&self, id: UserId) -> Result<User, EdnovaError> {
        self.store.user(id)?.ok_or(EdnovaError::UserNotFound(id))
    }

    fn require_session(&self, id: SessionId) -> Result<Session, EdnovaError> {
        self.store
            .session(id)?
            .ok_or(EdnovaError::SessionNotFound(id))
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Register a new user. Identifiers are caller-supplied; the display
    /// name must be non-blank and within [`MAX_NAME_LENGTH`].
    pub fn register_user(&mut self, user: &User) -> Result<(), EdnovaError> {
        let name = user.name.trim();
        if name.is_empty() {
            return Err(EdnovaError::Validation(
                "Name must not be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EdnovaError::Validation(format!(
                "Name exceeds {MAX_NAME_LENGTH} characters"
            )));
        }
        self.store.insert_user(user)
    }

    /// Fetch a user by identifier.
    pub fn user(&self, id: UserId) -> Result<Option<User>, EdnovaError> {
        self.store.user(id)
    }

    /// Total number of registered users.
    pub fn user_count(&self) -> Result<usize, EdnovaError> {
        self.store.user_count()
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    /// Create a session hosted by `host`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_session(
        &mut self,
        host: UserId,
        id: SessionId,
        title: &str,
        description: &str,
        scheduled_time: Timestamp,
        duration_minutes: u32,
        now: Timestamp,
    ) -> Result<Session, EdnovaError> {
        let host = self.require_user(host)?;
        Lifecycle::create_session(
            &mut self.store,
            &host,
            id,
            title,
            description,
            scheduled_time,
            duration_minutes,
            now,
        )
    }

    /// Claim the student slot of a session. First claim wins.
    pub fn book(&mut self, id: SessionId, student: UserId) -> Result<Session, EdnovaError> {
        let student = self.require_user(student)?;
        Lifecycle::book(&mut self.store, id, &student)
    }

    /// Check join admission without entering.
    pub fn check_join(
        &self,
        id: SessionId,
        principal: UserId,
        now: Timestamp,
    ) -> Result<JoinVerdict, EdnovaError> {
        let session = self.require_session(id)?;
        Ok(Lifecycle::can_join(&session, principal, now))
    }

    /// Join a session: the room reference is released only on admission.
    pub fn join(
        &self,
        id: SessionId,
        principal: UserId,
        now: Timestamp,
    ) -> Result<(JoinVerdict, Option<RoomRef>), EdnovaError> {
        let session = self.require_session(id)?;
        let verdict = Lifecycle::can_join(&session, principal, now);
        let room = verdict.is_admitted().then(|| session.room.clone());
        Ok((verdict, room))
    }

    /// Move a session to completed. Either participant may do this.
    pub fn complete(&mut self, id: SessionId, principal: UserId) -> Result<Session, EdnovaError> {
        let principal = self.require_user(principal)?;
        Lifecycle::complete(&mut self.store, id, &principal)
    }

    /// Withdraw a session. Host only.
    pub fn cancel(&mut self, id: SessionId, principal: UserId) -> Result<Session, EdnovaError> {
        let principal = self.require_user(principal)?;
        Lifecycle::cancel(&mut self.store, id, &principal)
    }

    /// Fetch a session by identifier.
    pub fn session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError> {
        self.store.session(id)
    }

    /// All sessions ordered by scheduled time, ties broken by identifier.
    pub fn sessions(&self) -> Result<Vec<Session>, EdnovaError> {
        self.store.sessions_by_time()
    }

    /// Sessions where the user is host or booked student.
    pub fn sessions_for_user(&self, user: UserId) -> Result<Vec<Session>, EdnovaError> {
        self.store.sessions_for_user(user)
    }

    /// The user's next scheduled sessions from `now`, soonest first.
    pub fn upcoming_sessions(
        &self,
        user: UserId,
        now: Timestamp,
        limit: usize,
    ) -> Result<Vec<Session>, EdnovaError> {
        let mut rows = self.store.sessions_for_user(user)?;
        rows.retain(|s| {
            s.status == SessionStatus::Scheduled && s.scheduled_time.seconds_from(now) >= 0
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Total number of sessions, cancelled included.
    pub fn session_count(&self) -> Result<usize, EdnovaError> {
        self.store.session_count()
    }

    // -------------------------------------------------------------------------
    // Feedback and notes
    // -------------------------------------------------------------------------

    /// Record feedback from the booked student of a completed session.
    pub fn submit_feedback(
        &mut self,
        session: SessionId,
        student: UserId,
        rating: u8,
        comment: Option<&str>,
        now: Timestamp,
    ) -> Result<Feedback, EdnovaError> {
        let student = self.require_user(student)?;
        Recorder::submit_feedback(&mut self.store, session, &student, rating, comment, now)
    }

    /// All feedback received by a teacher, newest first.
    pub fn feedback_for_teacher(&self, teacher: UserId) -> Result<Vec<Feedback>, EdnovaError> {
        Recorder::feedback_for_teacher(&self.store, teacher)
    }

    /// Aggregate a teacher's received ratings.
    pub fn rating_summary(&self, teacher: UserId) -> Result<RatingSummary, EdnovaError> {
        Recorder::rating_summary(&self.store, teacher)
    }

    /// Append a note to a session. Participants only.
    pub fn add_note(
        &mut self,
        id: NoteId,
        session: SessionId,
        author: UserId,
        content: &str,
        now: Timestamp,
    ) -> Result<Note, EdnovaError> {
        let author = self.require_user(author)?;
        Recorder::add_note(&mut self.store, id, session, &author, content, now)
    }

    /// All notes of a session in append order. Participants only.
    pub fn notes(&self, session: SessionId, principal: UserId) -> Result<Vec<Note>, EdnovaError> {
        let principal = self.require_user(principal)?;
        Recorder::notes(&self.store, session, &principal)
    }

    // -------------------------------------------------------------------------
    // Assessment
    // -------------------------------------------------------------------------

    /// Score an assessment submission and set the user's skill level.
    pub fn submit_assessment(
        &mut self,
        user: UserId,
        answers: &[usize],
        now: Timestamp,
    ) -> Result<SkillTestResult, EdnovaError> {
        let user = self.require_user(user)?;
        Assessment::submit(&mut self.store, &user, answers, now)
    }

    /// Assessment history for a user in submission order.
    pub fn assessment_results(&self, user: UserId) -> Result<Vec<SkillTestResult>, EdnovaError> {
        self.store.skill_results_for_user(user)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Physically delete cancelled sessions scheduled before `before`.
    /// Returns the number of records removed. Offline maintenance only;
    /// the lifecycle itself never deletes.
    pub fn prune_cancelled(&mut self, before: Timestamp) -> Result<usize, EdnovaError> {
        let doomed: Vec<SessionId> = self
            .store
            .sessions_by_time()?
            .into_iter()
            .filter(|s| {
                s.status == SessionStatus::Cancelled && s.scheduled_time.seconds_from(before) < 0
            })
            .map(|s| s.id)
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.store.remove_session(id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Compact the persistent backend. No-op for in-memory storage.
    pub fn compact(&mut self) -> Result<(), EdnovaError> {
        match &mut self.store {
            StoreBackend::InMemory(_) => Ok(()),
            StoreBackend::Persistent(s) => s.compact(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    const NOW: Timestamp = Timestamp::from_unix(1_700_000_000);

    fn seed_teacher(registry: &mut Registry, n: u128) -> UserId {
        let user = User::new(UserId::from_u128(n), format!("teacher-{n}"), Role::Teacher);
        registry.register_user(&user).unwrap();
        // Any completed assessment unlocks hosting; the score only sets the tier.
        let answers = vec![0; crate::primitives::QUESTION_COUNT];
        registry.submit_assessment(user.id, &answers, NOW).unwrap();
        user.id
    }

    fn seed_student(registry: &mut Registry, n: u128) -> UserId {
        let user = User::new(UserId::from_u128(n), format!("student-{n}"), Role::Student);
        registry.register_user(&user).unwrap();
        user.id
    }

    #[test]
    fn full_flow_over_memory_backend() {
        let mut registry = Registry::new();
        assert!(!registry.is_persistent());

        let host = seed_teacher(&mut registry, 1);
        let student = seed_student(&mut registry, 2);
        let rival = seed_student(&mut registry, 3);

        let start = NOW.plus_seconds(3600);
        let session = registry
            .create_session(
                host,
                SessionId::from_u128(10),
                "Algebra",
                "Linear equations",
                start,
                60,
                NOW,
            )
            .unwrap();

        registry.book(session.id, student).unwrap();
        let err = registry.book(session.id, rival).unwrap_err();
        assert!(matches!(err, EdnovaError::Conflict(_)));

        // Room is withheld until admission.
        let (verdict, room) = registry.join(session.id, student, NOW).unwrap();
        assert!(!verdict.is_admitted());
        assert!(room.is_none());
        let (verdict, room) = registry
            .join(session.id, student, start.plus_seconds(-900))
            .unwrap();
        assert!(verdict.is_admitted());
        assert_eq!(room, Some(session.room.clone()));

        registry.complete(session.id, student).unwrap();
        registry
            .submit_feedback(session.id, student, 5, Some("clear and patient"), start)
            .unwrap();
        let summary = registry.rating_summary(host).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average_centi, 500);
    }

    #[test]
    fn upcoming_filters_terminal_and_past() {
        let mut registry = Registry::new();
        let host = seed_teacher(&mut registry, 1);

        let future = registry
            .create_session(
                host,
                SessionId::from_u128(10),
                "Soon",
                "",
                NOW.plus_seconds(600),
                30,
                NOW,
            )
            .unwrap();
        let cancelled = registry
            .create_session(
                host,
                SessionId::from_u128(11),
                "Withdrawn",
                "",
                NOW.plus_seconds(1200),
                30,
                NOW,
            )
            .unwrap();
        registry.cancel(cancelled.id, host).unwrap();

        let upcoming = registry.upcoming_sessions(host, NOW, 10).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, future.id);

        // Once its start has passed, the session drops off the upcoming list.
        let later = registry
            .upcoming_sessions(host, NOW.plus_seconds(601), 10)
            .unwrap();
        assert!(later.is_empty());
    }

    #[test]
    fn prune_removes_only_old_cancelled_sessions() {
        let mut registry = Registry::new();
        let host = seed_teacher(&mut registry, 1);

        let kept = registry
            .create_session(
                host,
                SessionId::from_u128(10),
                "Kept",
                "",
                NOW.plus_seconds(600),
                30,
                NOW,
            )
            .unwrap();
        let doomed = registry
            .create_session(
                host,
                SessionId::from_u128(11),
                "Doomed",
                "",
                NOW.plus_seconds(1200),
                30,
                NOW,
            )
            .unwrap();
        registry.cancel(doomed.id, host).unwrap();

        // Cutoff before the cancelled session's start: nothing to prune.
        assert_eq!(registry.prune_cancelled(NOW).unwrap(), 0);
        // Cutoff after it: the cancelled record goes, the scheduled one stays.
        assert_eq!(
            registry.prune_cancelled(NOW.plus_seconds(7200)).unwrap(),
            1
        );
        assert!(registry.session(doomed.id).unwrap().is_none());
        assert!(registry.session(kept.id).unwrap().is_some());
    }

    #[test]
    fn persistent_backend_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("registry.redb");
        let session_id = SessionId::from_u128(10);
        {
            let mut registry = Registry::with_redb(&path).unwrap();
            assert!(registry.is_persistent());
            let host = seed_teacher(&mut registry, 1);
            registry
                .create_session(
                    host,
                    session_id,
                    "Persistent",
                    "",
                    NOW.plus_seconds(600),
                    30,
                    NOW,
                )
                .unwrap();
        }
        let registry = Registry::with_redb(&path).unwrap();
        assert_eq!(registry.session_count().unwrap(), 1);
        assert!(registry.session(session_id).unwrap().is_some());
    }

    #[test]
    fn register_bounds_the_display_name() {
        let mut registry = Registry::new();

        let blank = User::new(UserId::from_u128(1), "   ", Role::Student);
        let err = registry.register_user(&blank).unwrap_err();
        assert!(matches!(err, EdnovaError::Validation(_)));

        let long_name = "x".repeat(crate::primitives::MAX_NAME_LENGTH + 1);
        let oversized = User::new(UserId::from_u128(2), long_name, Role::Student);
        let err = registry.register_user(&oversized).unwrap_err();
        assert!(matches!(err, EdnovaError::Validation(_)));

        let at_limit = "x".repeat(crate::primitives::MAX_NAME_LENGTH);
        let exact = User::new(UserId::from_u128(3), at_limit, Role::Student);
        registry.register_user(&exact).unwrap();
        assert_eq!(registry.user_count().unwrap(), 1);
    }

    #[test]
    fn unknown_principals_are_rejected() {
        let mut registry = Registry::new();
        let ghost = UserId::from_u128(404);
        let err = registry
            .create_session(
                ghost,
                SessionId::from_u128(10),
                "Nope",
                "",
                NOW.plus_seconds(600),
                30,
                NOW,
            )
            .unwrap_err();
        assert!(matches!(err, EdnovaError::UserNotFound(_)));
    }
}
