//! # Record Store
//!
//! The deterministic record storage for the EdNova CORE.
//!
//! This module defines the `RecordStore` trait and its in-memory backend.
//! All data structures use `BTreeMap` for deterministic ordering.
//!
//! Booking is the one field with concurrent writers, so the trait exposes it
//! only as a conditional update ([`RecordStore::claim_student`]); the same
//! applies to status transitions and the first-feedback insert. Plain
//! read-then-write is reserved for advisory appends (notes).

use crate::{
    EdnovaError, Feedback, Note, Session, SessionId, SessionStatus, SkillLevel, SkillTestResult,
    User, UserId,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// The RecordStore trait defines the storage operations of the core.
///
/// All fallible operations return `Result<T, EdnovaError>` to support both
/// in-memory and persistent storage backends uniformly. Conditional updates
/// raise the taxonomy error themselves (`Conflict`, `State`, not-found), so
/// a backend can make the check-and-write atomic.
pub trait RecordStore {
    /// Insert a new user. Fails with `Conflict` if the identifier is taken.
    fn insert_user(&mut self, user: &User) -> Result<(), EdnovaError>;

    /// Fetch a user by identifier.
    fn user(&self, id: UserId) -> Result<Option<User>, EdnovaError>;

    /// Overwrite a user's skill level with a fresh classification.
    fn set_skill_level(&mut self, id: UserId, level: SkillLevel) -> Result<(), EdnovaError>;

    /// Insert a new session. Fails with `Conflict` if the identifier is taken.
    fn insert_session(&mut self, session: &Session) -> Result<(), EdnovaError>;

    /// Fetch a session by identifier.
    fn session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError>;

    /// All sessions ordered by scheduled time, ties broken by identifier.
    fn sessions_by_time(&self) -> Result<Vec<Session>, EdnovaError>;

    /// Sessions where the user is host or booked student, ordered by
    /// scheduled time.
    fn sessions_for_user(&self, user: UserId) -> Result<Vec<Session>, EdnovaError>;

    /// Conditionally assign the student slot: succeeds only while the
    /// session is scheduled and unbooked. The check and the write are one
    /// atomic step. Fails with `Conflict` when already booked, `State` when
    /// not scheduled.
    fn claim_student(&mut self, id: SessionId, student: UserId) -> Result<(), EdnovaError>;

    /// Conditionally move a session into a terminal status: succeeds only
    /// while the current status is scheduled. Fails with `State` when the
    /// session is already terminal, `Validation` if `to` is not terminal.
    fn transition_status(&mut self, id: SessionId, to: SessionStatus) -> Result<(), EdnovaError>;

    /// Physically delete a session record. Returns whether it existed.
    /// Lifecycle policy never deletes; this serves offline maintenance only.
    fn remove_session(&mut self, id: SessionId) -> Result<bool, EdnovaError>;

    /// Insert feedback, at most one per (session, student): the occupancy
    /// check and the write are one atomic step. Fails with `Conflict` when
    /// that pair already submitted.
    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<(), EdnovaError>;

    /// All feedback received by a teacher, newest first.
    fn feedback_for_teacher(&self, teacher: UserId) -> Result<Vec<Feedback>, EdnovaError>;

    /// Append a note to a session.
    fn insert_note(&mut self, note: &Note) -> Result<(), EdnovaError>;

    /// All notes for a session in append order.
    fn notes_for_session(&self, id: SessionId) -> Result<Vec<Note>, EdnovaError>;

    /// Append an assessment result. Earlier results are retained.
    fn insert_skill_result(&mut self, result: &SkillTestResult) -> Result<(), EdnovaError>;

    /// All assessment results for a user in submission order.
    fn skill_results_for_user(&self, user: UserId) -> Result<Vec<SkillTestResult>, EdnovaError>;

    /// Total number of registered users.
    fn user_count(&self) -> Result<usize, EdnovaError>;

    /// Total number of sessions, cancelled included.
    fn session_count(&self) -> Result<usize, EdnovaError>;
}

// =============================================================================
// MEMORY STORE IMPLEMENTATION
// =============================================================================

/// The in-memory record store.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed. Conditional updates are atomic because every
/// mutation holds the single `&mut self` borrow.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// User storage: UserId -> User
    users: BTreeMap<UserId, User>,

    /// Session storage: SessionId -> Session
    sessions: BTreeMap<SessionId, Session>,

    /// Feedback keyed by its uniqueness pair.
    feedback: BTreeMap<(SessionId, UserId), Feedback>,

    /// Notes per session in append order.
    notes: BTreeMap<SessionId, Vec<Note>>,

    /// Assessment history per user in submission order.
    skill_results: BTreeMap<UserId, Vec<SkillTestResult>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert_user(&mut self, user: &User) -> Result<(), EdnovaError> {
        if self.users.contains_key(&user.id) {
            return Err(EdnovaError::Conflict(format!(
                "User {} already registered",
                user.id
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, EdnovaError> {
        Ok(self.users.get(&id).cloned())
    }

    fn set_skill_level(&mut self, id: UserId, level: SkillLevel) -> Result<(), EdnovaError> {
        match self.users.get_mut(&id) {
            Some(user) => {
                user.skill_level = Some(level);
                Ok(())
            }
            None => Err(EdnovaError::UserNotFound(id)),
        }
    }

    fn insert_session(&mut self, session: &Session) -> Result<(), EdnovaError> {
        if self.sessions.contains_key(&session.id) {
            return Err(EdnovaError::Conflict(format!(
                "Session {} already exists",
                session.id
            )));
        }
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn sessions_by_time(&self) -> Result<Vec<Session>, EdnovaError> {
        let mut rows: Vec<Session> = self.sessions.values().cloned().collect();
        rows.sort_by_key(|s| (s.scheduled_time, s.id));
        Ok(rows)
    }

    fn sessions_for_user(&self, user: UserId) -> Result<Vec<Session>, EdnovaError> {
        let mut rows: Vec<Session> = self
            .sessions
            .values()
            .filter(|s| s.is_participant(user))
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.scheduled_time, s.id));
        Ok(rows)
    }

    fn claim_student(&mut self, id: SessionId, student: UserId) -> Result<(), EdnovaError> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(EdnovaError::SessionNotFound(id));
        };
        if session.status != SessionStatus::Scheduled {
            return Err(EdnovaError::State(session.status));
        }
        if session.student.is_some() {
            return Err(EdnovaError::Conflict(
                "Session is already booked".to_string(),
            ));
        }
        session.student = Some(student);
        Ok(())
    }

    fn transition_status(&mut self, id: SessionId, to: SessionStatus) -> Result<(), EdnovaError> {
        if !to.is_terminal() {
            return Err(EdnovaError::Validation(format!(
                "Illegal transition target: {to}"
            )));
        }
        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(EdnovaError::SessionNotFound(id));
        };
        if session.status.is_terminal() {
            return Err(EdnovaError::State(session.status));
        }
        session.status = to;
        Ok(())
    }

    fn remove_session(&mut self, id: SessionId) -> Result<bool, EdnovaError> {
        Ok(self.sessions.remove(&id).is_some())
    }

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<(), EdnovaError> {
        let key = (feedback.session, feedback.student);
        if self.feedback.contains_key(&key) {
            return Err(EdnovaError::Conflict(
                "Feedback already submitted for this session".to_string(),
            ));
        }
        self.feedback.insert(key, feedback.clone());
        Ok(())
    }

    fn feedback_for_teacher(&self, teacher: UserId) -> Result<Vec<Feedback>, EdnovaError> {
        let mut rows: Vec<Feedback> = self
            .feedback
            .values()
            .filter(|f| f.teacher == teacher)
            .cloned()
            .collect();
        rows.sort_by_key(|f| (Reverse(f.created_at), f.session));
        Ok(rows)
    }

    fn insert_note(&mut self, note: &Note) -> Result<(), EdnovaError> {
        self.notes
            .entry(note.session)
            .or_default()
            .push(note.clone());
        Ok(())
    }

    fn notes_for_session(&self, id: SessionId) -> Result<Vec<Note>, EdnovaError> {
        Ok(self.notes.get(&id).cloned().unwrap_or_default())
    }

    fn insert_skill_result(&mut self, result: &SkillTestResult) -> Result<(), EdnovaError> {
        self.skill_results
            .entry(result.user)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    fn skill_results_for_user(&self, user: UserId) -> Result<Vec<SkillTestResult>, EdnovaError> {
        Ok(self.skill_results.get(&user).cloned().unwrap_or_default())
    }

    fn user_count(&self) -> Result<usize, EdnovaError> {
        Ok(self.users.len())
    }

    fn session_count(&self) -> Result<usize, EdnovaError> {
        Ok(self.sessions.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
