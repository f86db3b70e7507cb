//! # Core Type Definitions
//!
//! This module contains all core types for the EdNova session substrate:
//! - Principal and record identifiers (`UserId`, `SessionId`, `NoteId`)
//! - Time representation (`Timestamp`)
//! - Closed role/state enums (`Role`, `SkillLevel`, `SessionStatus`)
//! - Stored records (`User`, `Session`, `Feedback`, `Note`, `SkillTestResult`)
//! - Error types (`EdnovaError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where used as `BTreeMap`/`BTreeSet` keys
//! - Use saturating arithmetic for time deltas to prevent overflow
//! - Never read the clock; `Timestamp` values are always supplied by the caller

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a user (teacher or student).
///
/// Opaque and stable: issued once at registration by the identity flow and
/// never reinterpreted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// Globally unique, caller-generated identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

/// Unique identifier for a session note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub Uuid);

impl UserId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The identifier as a 128-bit integer (storage key form).
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.as_u128()
    }

    /// Rebuild the identifier from its 128-bit storage key form.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The identifier as a 128-bit integer (storage key form).
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.as_u128()
    }

    /// Rebuild the identifier from its 128-bit storage key form.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NoteId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The identifier as a 128-bit integer (storage key form).
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.as_u128()
    }

    /// Rebuild the identifier from its 128-bit storage key form.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TIME
// =============================================================================

/// A point in time as unix epoch seconds.
///
/// The core performs no clock reads; every time-gated operation receives the
/// caller's `now`. All arithmetic is saturating integer arithmetic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Create a timestamp from unix epoch seconds.
    #[must_use]
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    /// The raw epoch-seconds value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Seconds from `now` until this instant. Negative when this instant is
    /// in the past.
    #[must_use]
    pub const fn seconds_from(self, now: Timestamp) -> i64 {
        self.0.saturating_sub(now.0)
    }

    /// This instant shifted forward by the given number of seconds.
    #[must_use]
    pub const fn plus_seconds(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

// =============================================================================
// ROLE & SKILL LEVEL
// =============================================================================

/// The two principal roles. Closed enum; there is no third role and no
/// free-form role string anywhere in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Hosts sessions once assessed.
    Teacher,
    /// Books and attends sessions.
    Student,
}

impl Role {
    /// Get the role name as stored and transmitted.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = EdnovaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(EdnovaError::Validation(format!(
                "Unknown role '{other}', expected teacher or student"
            ))),
        }
    }
}

/// Skill classification produced by the assessment engine.
///
/// Ordered: `Basic < Intermediate < Advanced`. A teacher with *no* level
/// (`Option::None` on [`User`]) has not been assessed and cannot host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    /// Score below 50.
    Basic,
    /// Score 50–79.
    Intermediate,
    /// Score 80 and above.
    Advanced,
}

impl SkillLevel {
    /// Get the level name as stored and transmitted.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Basic => "Basic",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// SESSION STATUS
// =============================================================================

/// Lifecycle state of a session.
///
/// Monotone: `scheduled → {completed, cancelled}`; the two right-hand states
/// are terminal and admit no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, possibly booked, not yet held.
    Scheduled,
    /// Held and ended by a participant. Terminal.
    Completed,
    /// Withdrawn by the host before being held. Terminal.
    Cancelled,
}

impl SessionStatus {
    /// Get the status name as stored and transmitted.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Check whether this status admits no further transition.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ROOM REFERENCE
// =============================================================================

/// Opaque URL-like reference to the external conference room.
///
/// Generated once at session creation; the core never interprets its
/// contents beyond passing it through.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomRef(pub String);

impl RoomRef {
    /// Wrap a room reference string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// A registered principal.
///
/// `skill_level` is meaningful only for teachers; `None` on a teacher means
/// "not yet assessed, not capable of hosting". Only the assessment engine
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier issued at registration.
    pub id: UserId,
    /// Display name shown to other participants.
    pub name: String,
    /// Closed role, fixed at registration.
    pub role: Role,
    /// Latest assessed level; `None` until the first assessment.
    pub skill_level: Option<SkillLevel>,
}

impl User {
    /// Create a new, unassessed user.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            skill_level: None,
        }
    }
}

/// A scheduled one-on-one teaching session.
///
/// `student` is a single-assignment field: it moves from `None` to a
/// concrete student exactly once (booking), enforced by the store's
/// conditional update. `status` follows [`SessionStatus`]'s monotone order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Globally unique, caller-generated identifier.
    pub id: SessionId,
    /// The hosting teacher.
    pub host: UserId,
    /// The booked student, `None` while unbooked.
    pub student: Option<UserId>,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-text description.
    pub description: String,
    /// Scheduled start, strictly in the future at creation.
    pub scheduled_time: Timestamp,
    /// Planned length in minutes.
    pub duration_minutes: u32,
    /// Opaque conference room reference.
    pub room: RoomRef,
    /// Lifecycle state.
    pub status: SessionStatus,
}

impl Session {
    /// Create a freshly scheduled, unbooked session.
    #[must_use]
    pub fn new(
        id: SessionId,
        host: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        scheduled_time: Timestamp,
        duration_minutes: u32,
        room: RoomRef,
    ) -> Self {
        Self {
            id,
            host,
            student: None,
            title: title.into(),
            description: description.into(),
            scheduled_time,
            duration_minutes,
            room,
            status: SessionStatus::Scheduled,
        }
    }

    /// Check whether the given user is the host or the booked student.
    #[must_use]
    pub fn is_participant(&self, user: UserId) -> bool {
        self.host == user || self.student == Some(user)
    }
}

/// Post-session feedback left by the booked student for the host.
///
/// Immutable after creation; at most one per (session, student) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// The completed session this feedback refers to.
    pub session: SessionId,
    /// The student who left the feedback.
    pub student: UserId,
    /// The teacher who hosted the session.
    pub teacher: UserId,
    /// Rating in `RATING_MIN..=RATING_MAX`.
    pub rating: u8,
    /// Optional free-text comment, trimmed, `None` when empty.
    pub comment: Option<String>,
    /// Caller-supplied creation instant.
    pub created_at: Timestamp,
}

impl Feedback {
    /// Create a feedback record.
    #[must_use]
    pub fn new(
        session: SessionId,
        student: UserId,
        teacher: UserId,
        rating: u8,
        comment: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            session,
            student,
            teacher,
            rating,
            comment,
            created_at,
        }
    }
}

/// Free-text note attached to a session by one of its participants.
/// Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique note identifier.
    pub id: NoteId,
    /// The session this note belongs to.
    pub session: SessionId,
    /// The participant who wrote it.
    pub author: UserId,
    /// Trimmed, non-empty content.
    pub content: String,
    /// Caller-supplied creation instant.
    pub created_at: Timestamp,
}

impl Note {
    /// Create a note record.
    #[must_use]
    pub fn new(
        id: NoteId,
        session: SessionId,
        author: UserId,
        content: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session,
            author,
            content: content.into(),
            created_at,
        }
    }
}

/// One submitted skill assessment.
///
/// Historical results are retained; only the latest derived level is
/// reflected on the [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTestResult {
    /// The assessed user.
    pub user: UserId,
    /// Percentage score, 0–100.
    pub score: u8,
    /// Level derived from the score.
    pub level: SkillLevel,
    /// Caller-supplied completion instant.
    pub completed_at: Timestamp,
}

impl SkillTestResult {
    /// Create a result record.
    #[must_use]
    pub const fn new(user: UserId, score: u8, level: SkillLevel, completed_at: Timestamp) -> Self {
        Self {
            user,
            score,
            level,
            completed_at,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the EdNova core.
///
/// - No silent failures
/// - Use `Result<T, EdnovaError>` for fallible operations
/// - The core never panics; all errors must be recoverable
/// - Every precondition failure is raised before any mutation; only
///   [`EdnovaError::Conflict`] can surface after an attempted write, and a
///   caller recovering from it re-reads the record to reconcile
#[derive(Debug, Error)]
pub enum EdnovaError {
    /// Malformed or missing input (empty title, past start time, rating out
    /// of bounds, over-long field).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A role or skill-level gate was not met.
    #[error("Capability not met: {0}")]
    Capability(String),

    /// The principal lacks rights over this specific resource.
    #[error("Not authorized")]
    NotAuthorized,

    /// The operation is illegal for the session's current status.
    #[error("Operation not permitted while session is {0}")]
    State(SessionStatus),

    /// Lost a concurrent single-assignment race; safe to re-read and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An assessment was submitted with missing answers.
    #[error("Assessment incomplete: {answered} of {expected} answers provided")]
    Incomplete {
        /// Number of answers actually provided.
        answered: usize,
        /// Number of questions in the bank.
        expected: usize,
    },

    /// No session exists under the given identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// No user exists under the given identifier.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The record store failed; the provider message is surfaced verbatim.
    #[error("Store error: {0}")]
    Store(String),

    /// The identity gateway rejected the credentials or token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A storage codec failure (encode or decode).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_names_round_trip() {
        assert_eq!(Role::Teacher.as_str(), "teacher");
        assert_eq!(Role::Student.as_str(), "student");
        assert_eq!(Role::from_str("teacher").expect("parse"), Role::Teacher);
        assert_eq!(Role::from_str("student").expect("parse"), Role::Student);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn skill_levels_are_ordered() {
        assert!(SkillLevel::Basic < SkillLevel::Intermediate);
        assert!(SkillLevel::Intermediate < SkillLevel::Advanced);
        assert_eq!(SkillLevel::Advanced.as_str(), "Advanced");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SessionStatus::Scheduled.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn timestamp_delta_saturates() {
        let far = Timestamp::from_unix(i64::MAX);
        let origin = Timestamp::from_unix(i64::MIN);
        assert_eq!(far.seconds_from(origin), i64::MAX);
        assert_eq!(Timestamp::from_unix(100).seconds_from(Timestamp::from_unix(40)), 60);
        assert_eq!(Timestamp::from_unix(40).seconds_from(Timestamp::from_unix(100)), -60);
    }

    #[test]
    fn id_storage_key_round_trip() {
        let id = SessionId::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        assert_eq!(SessionId::from_u128(id.as_u128()), id);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn new_session_is_unbooked_and_scheduled() {
        let host = UserId::from_u128(1);
        let session = Session::new(
            SessionId::from_u128(10),
            host,
            "Algebra",
            "Linear equations",
            Timestamp::from_unix(1_000),
            60,
            RoomRef::new("https://example.invalid/room"),
        );
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert!(session.student.is_none());
        assert!(session.is_participant(host));
        assert!(!session.is_participant(UserId::from_u128(2)));
    }

    #[test]
    fn participant_includes_booked_student() {
        let mut session = Session::new(
            SessionId::from_u128(10),
            UserId::from_u128(1),
            "T",
            "D",
            Timestamp::from_unix(1_000),
            30,
            RoomRef::new("r"),
        );
        let student = UserId::from_u128(7);
        assert!(!session.is_participant(student));
        session.student = Some(student);
        assert!(session.is_participant(student));
    }

    #[test]
    fn unassessed_user_has_no_level() {
        let user = User::new(UserId::from_u128(3), "pat", Role::Teacher);
        assert!(user.skill_level.is_none());
    }
}
