//! # Session Lifecycle Engine
//!
//! Stateless engine driving a session through its lifecycle:
//!
//! ```text
//! created (scheduled, unbooked)
//!     │ book              ── single-assignment, first claim wins
//!     ▼
//! scheduled (booked)
//!     │ complete / cancel ── monotone, terminal
//!     ▼
//! completed | cancelled
//! ```
//!
//! All operations are associated functions over any [`RecordStore`]; the
//! engine holds no state of its own and never reads a clock. Race-sensitive
//! transitions (booking, status changes) delegate the check to the store's
//! conditional updates so check and write stay one atomic step.

use crate::access::{AccessGate, Capability};
use crate::primitives::{
    JOIN_WINDOW_SECS, MAX_DESCRIPTION_LENGTH, MAX_DURATION_MINUTES, MAX_TITLE_LENGTH,
    MIN_DURATION_MINUTES, ROOM_BASE_URL, ROOM_PREFIX,
};
use crate::records::RecordStore;
use crate::types::{
    EdnovaError, RoomRef, Session, SessionId, SessionStatus, Timestamp, User, UserId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// JOIN VERDICT
// =============================================================================

/// Outcome of a join admission check.
///
/// The check is pure and repeatable; a verdict other than `Admitted` carries
/// enough context for the caller to explain the refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum JoinVerdict {
    /// The participant may enter the room now.
    Admitted,
    /// The principal is not a participant of this session.
    NotAuthorized,
    /// The session is no longer scheduled.
    NotScheduled {
        /// The terminal status the session reached.
        status: SessionStatus,
    },
    /// The join window has not opened yet.
    TooEarly {
        /// When the session starts; the window opens fifteen minutes before.
        scheduled_time: Timestamp,
    },
}

impl JoinVerdict {
    /// Whether the verdict admits the caller.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, JoinVerdict::Admitted)
    }
}

// =============================================================================
// LIFECYCLE ENGINE
// =============================================================================

/// The session lifecycle engine.
pub struct Lifecycle;

impl Lifecycle {
    /// Create a new scheduled session hosted by `host`.
    ///
    /// The host must be an assessed teacher. The title is required and the
    /// start time must lie strictly in the future of the caller's `now`.
    /// The room reference is derived from the session identifier and is
    /// fixed for the session's lifetime.
    #[allow(clippy::too_many_arguments)]
    pub fn create_session(
        store: &mut impl RecordStore,
        host: &User,
        id: SessionId,
        title: &str,
        description: &str,
        scheduled_time: Timestamp,
        duration_minutes: u32,
        now: Timestamp,
    ) -> Result<Session, EdnovaError> {
        AccessGate::require(Some(host), None, Capability::CreateSession)?;

        let title = title.trim();
        if title.is_empty() {
            return Err(EdnovaError::Validation("Title must not be empty".into()));
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err(EdnovaError::Validation(format!(
                "Title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }
        let description = description.trim();
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(EdnovaError::Validation(format!(
                "Description exceeds {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(EdnovaError::Validation(format!(
                "Duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes"
            )));
        }
        if scheduled_time.seconds_from(now) <= 0 {
            return Err(EdnovaError::Validation(
                "Scheduled time must be in the future".into(),
            ));
        }

        let room = Self::room_reference(id, &host.name);
        let session = Session::new(
            id,
            host.id,
            title,
            description,
            scheduled_time,
            duration_minutes,
            room,
        );
        store.insert_session(&session)?;
        Ok(session)
    }

    /// Claim the student slot of a session for `student`.
    ///
    /// Single assignment: of any number of concurrent claims exactly one
    /// succeeds and the rest observe `Conflict`. The occupancy check lives
    /// in the store so it is atomic with the write; the gate here only
    /// enforces the role (teachers never book, their own sessions included).
    pub fn book(
        store: &mut impl RecordStore,
        id: SessionId,
        student: &User,
    ) -> Result<Session, EdnovaError> {
        AccessGate::require(Some(student), None, Capability::BookSession)?;
        store.claim_student(id, student.id)?;
        store.session(id)?.ok_or(EdnovaError::SessionNotFound(id))
    }

    /// Decide whether `principal` may enter the session's room at `now`.
    ///
    /// Checks run in order: participation, status, then the join window.
    /// The window opens `JOIN_WINDOW_SECS` before the start, boundary
    /// inclusive, and never closes while the session stays scheduled; late
    /// joins are always admitted.
    #[must_use]
    pub fn can_join(session: &Session, principal: UserId, now: Timestamp) -> JoinVerdict {
        if !session.is_participant(principal) {
            return JoinVerdict::NotAuthorized;
        }
        if session.status != SessionStatus::Scheduled {
            return JoinVerdict::NotScheduled {
                status: session.status,
            };
        }
        if session.scheduled_time.seconds_from(now) > JOIN_WINDOW_SECS {
            return JoinVerdict::TooEarly {
                scheduled_time: session.scheduled_time,
            };
        }
        JoinVerdict::Admitted
    }

    /// Move a scheduled session to completed. Either participant may do
    /// this; the transition is terminal.
    pub fn complete(
        store: &mut impl RecordStore,
        id: SessionId,
        principal: &User,
    ) -> Result<Session, EdnovaError> {
        let session = store.session(id)?.ok_or(EdnovaError::SessionNotFound(id))?;
        AccessGate::require(Some(principal), Some(&session), Capability::CompleteSession)?;
        store.transition_status(id, SessionStatus::Completed)?;
        store.session(id)?.ok_or(EdnovaError::SessionNotFound(id))
    }

    /// Withdraw a scheduled session. Host only; the record is retained with
    /// status cancelled so listings stay truthful.
    pub fn cancel(
        store: &mut impl RecordStore,
        id: SessionId,
        principal: &User,
    ) -> Result<Session, EdnovaError> {
        let session = store.session(id)?.ok_or(EdnovaError::SessionNotFound(id))?;
        AccessGate::require(Some(principal), Some(&session), Capability::CancelSession)?;
        store.transition_status(id, SessionStatus::Cancelled)?;
        store.session(id)?.ok_or(EdnovaError::SessionNotFound(id))
    }

    /// Derive the conference room reference for a session.
    ///
    /// The room name embeds the session identifier, making it unique per
    /// session, and the fragment pre-fills the host's display name for the
    /// conference client. The host name is percent-encoded; the identifier
    /// needs no encoding.
    #[must_use]
    pub fn room_reference(id: SessionId, host_name: &str) -> RoomRef {
        RoomRef::new(format!(
            "{ROOM_BASE_URL}/{ROOM_PREFIX}{id}#userInfo.displayName=\"{}\"",
            urlencoding::encode(host_name)
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================
