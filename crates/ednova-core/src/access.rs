//! # Access Control Gate
//!
//! Derives the set of operations a principal may perform from role,
//! ownership, and assessment state. The gate is a pure function; it reads
//! nothing but its arguments and is evaluated before any store mutation.
//!
//! Rule order:
//! 1. Anyone, authenticated or not, may read public listings.
//! 2. Teachers may create sessions once assessed, and may take the
//!    assessment; they never book.
//! 3. Students may book; they never create.
//! 4. Ownership overrides role defaults: a participant may always view,
//!    join, complete, or annotate their own session, and the host may
//!    cancel it.
//!
//! The gate decides *who*, not *when*: status preconditions (a terminal
//! session cannot be completed again, a booked session cannot be claimed)
//! are enforced by the store's conditional updates so that the check and
//! the write stay atomic.

use crate::{EdnovaError, Role, Session, SessionStatus, User};
use std::collections::BTreeSet;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// One permitted operation. Closed enum; ordered so derived sets iterate
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Read public session listings and session detail.
    ListSessions,
    /// View a session the principal participates in.
    ViewSession,
    /// Create a new session as host.
    CreateSession,
    /// Claim the student slot of a session.
    BookSession,
    /// Enter the conference room of a session.
    JoinSession,
    /// Move a session to completed.
    CompleteSession,
    /// Withdraw a session before it is held.
    CancelSession,
    /// Leave post-session feedback as the booked student.
    SubmitFeedback,
    /// Append a note to a session.
    AddNote,
    /// Submit the skill assessment.
    TakeAssessment,
}

/// The Access Control Gate.
pub struct AccessGate;

impl AccessGate {
    /// Derive the capability set for a principal, optionally in the context
    /// of one session.
    ///
    /// With no session context, role-level capabilities are returned
    /// (`BookSession` for any student); with a session, booking is offered
    /// only while that session is scheduled and unbooked, and the
    /// ownership-derived capabilities are added.
    #[must_use]
    pub fn capabilities(principal: Option<&User>, session: Option<&Session>) -> BTreeSet<Capability> {
        let mut caps = BTreeSet::new();

        // Rule 1: public listings for everyone.
        caps.insert(Capability::ListSessions);

        let Some(user) = principal else {
            return caps;
        };

        // Rules 2 and 3: role defaults.
        match user.role {
            Role::Teacher => {
                caps.insert(Capability::TakeAssessment);
                if user.skill_level.is_some() {
                    caps.insert(Capability::CreateSession);
                }
            }
            Role::Student => {
                let bookable = session
                    .map(|s| s.student.is_none() && s.status == SessionStatus::Scheduled)
                    .unwrap_or(true);
                if bookable {
                    caps.insert(Capability::BookSession);
                }
            }
        }

        // Rule 4: ownership overrides role defaults.
        if let Some(s) = session {
            if s.is_participant(user.id) {
                caps.insert(Capability::ViewSession);
                caps.insert(Capability::JoinSession);
                caps.insert(Capability::CompleteSession);
                caps.insert(Capability::AddNote);
            }
            if s.host == user.id {
                caps.insert(Capability::CancelSession);
            }
            if s.student == Some(user.id) {
                caps.insert(Capability::SubmitFeedback);
            }
        }

        caps
    }

    /// Fail-fast check that the principal holds one capability.
    ///
    /// Missing role or assessment gates surface as
    /// [`EdnovaError::Capability`]; missing ownership surfaces as
    /// [`EdnovaError::NotAuthorized`]. Callers run this before touching the
    /// store, so a denial never leaves a partial write behind.
    pub fn require(
        principal: Option<&User>,
        session: Option<&Session>,
        capability: Capability,
    ) -> Result<(), EdnovaError> {
        if Self::capabilities(principal, session).contains(&capability) {
            return Ok(());
        }

        Err(match capability {
            Capability::CreateSession => EdnovaError::Capability(match principal {
                Some(u) if u.role == Role::Teacher => {
                    "Skill assessment required before hosting sessions".to_string()
                }
                Some(_) => "Only teachers may create sessions".to_string(),
                None => "Authentication required".to_string(),
            }),
            Capability::TakeAssessment => {
                EdnovaError::Capability("Only teachers take the skill assessment".to_string())
            }
            _ => EdnovaError::NotAuthorized,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomRef, SessionId, SkillLevel, Timestamp, UserId};

    fn teacher(assessed: bool) -> User {
        let mut user = User::new(UserId::from_u128(1), "pat", Role::Teacher);
        if assessed {
            user.skill_level = Some(SkillLevel::Intermediate);
        }
        user
    }

    fn student(n: u128) -> User {
        User::new(UserId::from_u128(n), format!("student-{n}"), Role::Student)
    }

    fn session(host: UserId) -> Session {
        Session::new(
            SessionId::from_u128(10),
            host,
            "Algebra",
            "",
            Timestamp::from_unix(10_000),
            60,
            RoomRef::new("r"),
        )
    }

    #[test]
    fn unauthenticated_gets_listings_only() {
        let caps = AccessGate::capabilities(None, None);
        assert_eq!(caps.len(), 1);
        assert!(caps.contains(&Capability::ListSessions));
    }

    #[test]
    fn unassessed_teacher_cannot_create() {
        let user = teacher(false);
        let caps = AccessGate::capabilities(Some(&user), None);
        assert!(!caps.contains(&Capability::CreateSession));
        assert!(caps.contains(&Capability::TakeAssessment));

        let denied = AccessGate::require(Some(&user), None, Capability::CreateSession);
        assert!(matches!(denied, Err(EdnovaError::Capability(_))));
    }

    #[test]
    fn assessed_teacher_creates_but_never_books() {
        let user = teacher(true);
        let caps = AccessGate::capabilities(Some(&user), None);
        assert!(caps.contains(&Capability::CreateSession));
        assert!(!caps.contains(&Capability::BookSession));
    }

    #[test]
    fn student_books_unbooked_scheduled_sessions_only() {
        let booker = student(2);
        let s = session(UserId::from_u128(1));
        assert!(
            AccessGate::capabilities(Some(&booker), Some(&s)).contains(&Capability::BookSession)
        );

        let mut booked = s.clone();
        booked.student = Some(UserId::from_u128(3));
        assert!(
            !AccessGate::capabilities(Some(&booker), Some(&booked))
                .contains(&Capability::BookSession)
        );

        let mut cancelled = s;
        cancelled.status = SessionStatus::Cancelled;
        assert!(
            !AccessGate::capabilities(Some(&booker), Some(&cancelled))
                .contains(&Capability::BookSession)
        );
    }

    #[test]
    fn ownership_overrides_role_defaults() {
        let host = teacher(true);
        let mut s = session(host.id);
        let booked = student(2);
        s.student = Some(booked.id);

        let host_caps = AccessGate::capabilities(Some(&host), Some(&s));
        assert!(host_caps.contains(&Capability::JoinSession));
        assert!(host_caps.contains(&Capability::CompleteSession));
        assert!(host_caps.contains(&Capability::CancelSession));
        assert!(!host_caps.contains(&Capability::SubmitFeedback));

        let student_caps = AccessGate::capabilities(Some(&booked), Some(&s));
        assert!(student_caps.contains(&Capability::JoinSession));
        assert!(student_caps.contains(&Capability::SubmitFeedback));
        assert!(!student_caps.contains(&Capability::CancelSession));
    }

    #[test]
    fn stranger_has_no_session_capabilities() {
        let stranger = student(9);
        let mut s = session(UserId::from_u128(1));
        s.student = Some(UserId::from_u128(2));

        let caps = AccessGate::capabilities(Some(&stranger), Some(&s));
        assert!(!caps.contains(&Capability::JoinSession));
        assert!(!caps.contains(&Capability::CompleteSession));
        assert!(!caps.contains(&Capability::AddNote));

        let denied = AccessGate::require(Some(&stranger), Some(&s), Capability::JoinSession);
        assert!(matches!(denied, Err(EdnovaError::NotAuthorized)));
    }
}
