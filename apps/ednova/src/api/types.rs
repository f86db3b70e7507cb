//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Responses carry a `success` flag plus either the payload or an `error`
//! message. Session payloads never include the conference room reference;
//! the room is released only through the join endpoint on admission.

use ednova_core::{JoinVerdict, Question, RatingSummary, Session, SkillLevel, User};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// AUTH REQUEST/RESPONSE
// =============================================================================

/// Registration request. The display name is derived from the email local
/// part unless given explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub secret: String,
    /// "teacher" or "student".
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
}

/// Authentication response carrying a bearer token on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: Option<String>,
    pub user: Option<UserJson>,
    pub error: Option<String>,
}

impl AuthResponse {
    pub fn success(token: impl Into<String>, user: &User) -> Self {
        Self {
            success: true,
            token: Some(token.into()),
            user: Some(UserJson::from_user(user)),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            user: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// USER JSON
// =============================================================================

/// Public user representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJson {
    pub id: String,
    pub name: String,
    pub role: String,
    pub skill_level: Option<String>,
}

impl UserJson {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            role: user.role.to_string(),
            skill_level: user.skill_level.map(|l| l.to_string()),
        }
    }
}

/// Wrapper for the authenticated-principal endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Option<UserJson>,
    pub error: Option<String>,
}

impl UserResponse {
    pub fn success(user: &User) -> Self {
        Self {
            success: true,
            user: Some(UserJson::from_user(user)),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SESSION JSON
// =============================================================================

/// Public session representation. Listings enrich each session with the
/// host's display name and skill level; the room reference is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionJson {
    pub id: String,
    pub host: String,
    pub host_name: Option<String>,
    pub host_skill_level: Option<String>,
    pub student: Option<String>,
    pub title: String,
    pub description: String,
    pub scheduled_time: i64,
    pub duration_minutes: u32,
    pub status: String,
}

impl SessionJson {
    pub fn from_session(session: &Session, host: Option<&User>) -> Self {
        Self {
            id: session.id.to_string(),
            host: session.host.to_string(),
            host_name: host.map(|u| u.name.clone()),
            host_skill_level: host.and_then(|u| u.skill_level).map(|l| l.to_string()),
            student: session.student.map(|s| s.to_string()),
            title: session.title.clone(),
            description: session.description.clone(),
            scheduled_time: session.scheduled_time.value(),
            duration_minutes: session.duration_minutes,
            status: session.status.to_string(),
        }
    }
}

/// Query parameters for the principal's session listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MySessionsQuery {
    /// Restrict to scheduled sessions from now on, soonest first.
    pub upcoming: bool,
    /// Row cap in upcoming mode.
    pub limit: Option<usize>,
}

/// Session creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Unix epoch seconds.
    pub scheduled_time: i64,
    pub duration_minutes: u32,
}

/// Single-session response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: Option<SessionJson>,
    pub error: Option<String>,
}

impl SessionResponse {
    pub fn success(session: SessionJson) -> Self {
        Self {
            success: true,
            session: Some(session),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            session: None,
            error: Some(msg.into()),
        }
    }
}

/// Session listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionJson>,
    pub error: Option<String>,
}

impl SessionsResponse {
    pub fn success(sessions: Vec<SessionJson>) -> Self {
        Self {
            success: true,
            sessions,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            sessions: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// JOIN RESPONSE
// =============================================================================

/// Join admission response. The room reference appears only when admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub success: bool,
    pub admitted: bool,
    /// Machine-readable refusal context; absent when admitted.
    pub verdict: Option<JoinVerdict>,
    pub room: Option<String>,
    pub error: Option<String>,
}

impl JoinResponse {
    pub fn from_verdict(verdict: JoinVerdict, room: Option<String>) -> Self {
        let admitted = verdict.is_admitted();
        Self {
            success: true,
            admitted,
            verdict: (!admitted).then_some(verdict),
            room,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            admitted: false,
            verdict: None,
            room: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// FEEDBACK REQUEST/RESPONSE
// =============================================================================

/// Feedback submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One feedback record as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackJson {
    pub session: String,
    pub student: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: i64,
}

/// A teacher's received feedback plus its aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackListResponse {
    pub success: bool,
    pub count: usize,
    /// Mean rating scaled by 100 (450 reads as 4.50).
    pub average_centi: u64,
    pub feedback: Vec<FeedbackJson>,
    pub error: Option<String>,
}

impl FeedbackListResponse {
    pub fn success(summary: RatingSummary, feedback: Vec<FeedbackJson>) -> Self {
        Self {
            success: true,
            count: summary.count,
            average_centi: summary.average_centi,
            feedback,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            average_centi: 0,
            feedback: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// NOTES REQUEST/RESPONSE
// =============================================================================

/// Note submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

/// One note as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteJson {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: i64,
}

/// Notes listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesResponse {
    pub success: bool,
    pub notes: Vec<NoteJson>,
    pub error: Option<String>,
}

impl NotesResponse {
    pub fn success(notes: Vec<NoteJson>) -> Self {
        Self {
            success: true,
            notes,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            notes: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ASSESSMENT REQUEST/RESPONSE
// =============================================================================

/// One question as JSON. The correct option index never leaves the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionJson {
    pub prompt: String,
    pub options: Vec<String>,
}

impl QuestionJson {
    pub fn from_question(question: &Question) -> Self {
        Self {
            prompt: question.prompt.to_string(),
            options: question.options.iter().map(|o| (*o).to_string()).collect(),
        }
    }
}

/// Question bank response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions: Vec<QuestionJson>,
}

/// Assessment submission: one chosen option index per question, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub answers: Vec<usize>,
}

/// Assessment result response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub success: bool,
    pub score: Option<u8>,
    pub level: Option<String>,
    pub error: Option<String>,
}

impl AssessmentResponse {
    pub fn success(score: u8, level: SkillLevel) -> Self {
        Self {
            success: true,
            score: Some(score),
            level: Some(level.to_string()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            score: None,
            level: None,
            error: Some(msg.into()),
        }
    }
}
