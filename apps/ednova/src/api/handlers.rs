//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Handlers own the nondeterminism the core refuses to touch: the wall
//! clock, UUID generation, and the identity gateway. Every core error maps
//! onto one HTTP status through [`error_status`].

use super::{
    AppState,
    types::{
        AssessmentRequest, AssessmentResponse, AuthResponse, CreateSessionRequest,
        FeedbackJson, FeedbackListResponse, FeedbackRequest, HealthResponse, JoinResponse,
        LoginRequest, MySessionsQuery, NoteJson, NoteRequest, NotesResponse, QuestionJson,
        QuestionsResponse, RegisterRequest, SessionJson, SessionResponse, SessionsResponse,
        UserResponse,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use ednova_core::{
    Assessment, EdnovaError, NoteId, Registry, Role, Session, SessionId, Timestamp, User, UserId,
};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// =============================================================================
// CLOCK & ERROR MAPPING
// =============================================================================

/// The server's wall clock, as a core timestamp.
fn now() -> Timestamp {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64);
    Timestamp::from_unix(secs)
}

/// Map a core error onto its HTTP status.
fn error_status(error: &EdnovaError) -> StatusCode {
    match error {
        EdnovaError::Validation(_) | EdnovaError::Incomplete { .. } => StatusCode::BAD_REQUEST,
        EdnovaError::Auth(_) => StatusCode::UNAUTHORIZED,
        EdnovaError::Capability(_) | EdnovaError::NotAuthorized => StatusCode::FORBIDDEN,
        EdnovaError::SessionNotFound(_) | EdnovaError::UserNotFound(_) => StatusCode::NOT_FOUND,
        EdnovaError::State(_) | EdnovaError::Conflict(_) => StatusCode::CONFLICT,
        EdnovaError::Store(_) | EdnovaError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Enrich a session with its host's public profile for listings.
fn session_json(registry: &Registry, session: &Session) -> SessionJson {
    let host = registry.user(session.host).ok().flatten();
    SessionJson::from_session(session, host.as_ref())
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// AUTH HANDLERS
// =============================================================================

/// Register a new user and log them in.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    let role: Role = match request.role.parse() {
        Ok(r) => r,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AuthResponse::error("Role must be teacher or student")),
            );
        }
    };

    // Display name defaults to the email local part.
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            request
                .email
                .split('@')
                .next()
                .unwrap_or("user")
                .to_string()
        });

    let user = User::new(UserId(Uuid::new_v4()), name, role);

    // Credentials first: the gateway owns email uniqueness and secret rules.
    {
        let mut gateway = state.gateway.write().await;
        if let Err(e) = gateway.register(&request.email, &request.secret, user.id) {
            return (error_status(&e), Json(AuthResponse::error(e.to_string())));
        }
    }
    {
        let mut registry = state.registry.write().await;
        if let Err(e) = registry.register_user(&user) {
            // Roll the credential back so the email stays available.
            let mut gateway = state.gateway.write().await;
            gateway.unregister(&request.email);
            return (error_status(&e), Json(AuthResponse::error(e.to_string())));
        }
    }

    let mut gateway = state.gateway.write().await;
    match gateway.authenticate(&request.email, &request.secret) {
        Ok(token) => (StatusCode::OK, Json(AuthResponse::success(token, &user))),
        Err(e) => (error_status(&e), Json(AuthResponse::error(e.to_string()))),
    }
}

/// Exchange credentials for a bearer token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    let token = {
        let mut gateway = state.gateway.write().await;
        match gateway.authenticate(&request.email, &request.secret) {
            Ok(token) => token,
            Err(e) => {
                return (error_status(&e), Json(AuthResponse::error(e.to_string())));
            }
        }
    };

    let user_id = {
        let gateway = state.gateway.read().await;
        gateway.resolve(&token)
    };
    let user = match user_id {
        Some(id) => {
            let registry = state.registry.read().await;
            registry.user(id).ok().flatten()
        }
        None => None,
    };
    match user {
        Some(user) => (StatusCode::OK, Json(AuthResponse::success(token, &user))),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(AuthResponse::error("Invalid credentials")),
        ),
    }
}

/// Revoke the presented bearer token.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    if let Some(token) = token {
        let mut gateway = state.gateway.write().await;
        gateway.revoke(token);
    }
    StatusCode::NO_CONTENT
}

/// The authenticated principal's profile.
pub async fn me_handler(Extension(user): Extension<User>) -> impl IntoResponse {
    (StatusCode::OK, Json(UserResponse::success(&user)))
}

// =============================================================================
// SESSION READ HANDLERS
// =============================================================================

/// Public session listing, ordered by scheduled time.
pub async fn list_sessions_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.sessions() {
        Ok(sessions) => {
            let rows = sessions.iter().map(|s| session_json(&registry, s)).collect();
            (StatusCode::OK, Json(SessionsResponse::success(rows)))
        }
        Err(e) => (error_status(&e), Json(SessionsResponse::error(e.to_string()))),
    }
}

/// Public session detail.
pub async fn session_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.session(SessionId(id)) {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(SessionResponse::success(session_json(&registry, &session))),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(SessionResponse::error(format!("Session not found: {id}"))),
        ),
        Err(e) => (error_status(&e), Json(SessionResponse::error(e.to_string()))),
    }
}

/// Upcoming-mode row cap when the client gives none.
const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// Sessions where the principal is host or booked student. With
/// `upcoming=true`, only scheduled sessions from now on, soonest first,
/// capped at `limit`.
pub async fn my_sessions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MySessionsQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let result = if query.upcoming {
        registry.upcoming_sessions(
            user.id,
            now(),
            query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT),
        )
    } else {
        registry.sessions_for_user(user.id)
    };
    match result {
        Ok(sessions) => {
            let rows = sessions.iter().map(|s| session_json(&registry, s)).collect();
            (StatusCode::OK, Json(SessionsResponse::success(rows)))
        }
        Err(e) => (error_status(&e), Json(SessionsResponse::error(e.to_string()))),
    }
}

// =============================================================================
// SESSION LIFECYCLE HANDLERS
// =============================================================================

/// Create a session hosted by the principal.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    let result = registry.create_session(
        user.id,
        SessionId(Uuid::new_v4()),
        &request.title,
        &request.description,
        Timestamp::from_unix(request.scheduled_time),
        request.duration_minutes,
        now(),
    );
    match result {
        Ok(session) => {
            tracing::info!(session = %session.id, host = %user.id, "session created");
            (
                StatusCode::CREATED,
                Json(SessionResponse::success(session_json(&registry, &session))),
            )
        }
        Err(e) => (error_status(&e), Json(SessionResponse::error(e.to_string()))),
    }
}

/// Claim the student slot. First claim wins; losers get a conflict.
pub async fn book_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.book(SessionId(id), user.id) {
        Ok(session) => {
            tracing::info!(session = %session.id, student = %user.id, "session booked");
            (
                StatusCode::OK,
                Json(SessionResponse::success(session_json(&registry, &session))),
            )
        }
        Err(e) => (error_status(&e), Json(SessionResponse::error(e.to_string()))),
    }
}

/// Join a session. The room reference is released only on admission.
pub async fn join_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.join(SessionId(id), user.id, now()) {
        Ok((verdict, room)) => (
            StatusCode::OK,
            Json(JoinResponse::from_verdict(
                verdict,
                room.map(|r| r.as_str().to_string()),
            )),
        ),
        Err(e) => (error_status(&e), Json(JoinResponse::error(e.to_string()))),
    }
}

/// Mark a session completed. Either participant may do this.
pub async fn complete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.complete(SessionId(id), user.id) {
        Ok(session) => (
            StatusCode::OK,
            Json(SessionResponse::success(session_json(&registry, &session))),
        ),
        Err(e) => (error_status(&e), Json(SessionResponse::error(e.to_string()))),
    }
}

/// Withdraw a session. Host only.
pub async fn cancel_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.cancel(SessionId(id), user.id) {
        Ok(session) => (
            StatusCode::OK,
            Json(SessionResponse::success(session_json(&registry, &session))),
        ),
        Err(e) => (error_status(&e), Json(SessionResponse::error(e.to_string()))),
    }
}

// =============================================================================
// FEEDBACK & NOTES HANDLERS
// =============================================================================

/// Submit feedback for a completed session. Booked student only, once.
pub async fn feedback_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    let result = registry.submit_feedback(
        SessionId(id),
        user.id,
        request.rating,
        request.comment.as_deref(),
        now(),
    );
    match result {
        Ok(_) => (StatusCode::CREATED, Json(serde_json::json!({ "success": true }))),
        Err(e) => (
            error_status(&e),
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// A teacher's received feedback with its rating aggregate. Public.
pub async fn teacher_feedback_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let teacher = UserId(id);
    let summary = match registry.rating_summary(teacher) {
        Ok(s) => s,
        Err(e) => {
            return (
                error_status(&e),
                Json(FeedbackListResponse::error(e.to_string())),
            );
        }
    };
    match registry.feedback_for_teacher(teacher) {
        Ok(rows) => {
            let feedback = rows
                .iter()
                .map(|f| FeedbackJson {
                    session: f.session.to_string(),
                    student: f.student.to_string(),
                    rating: f.rating,
                    comment: f.comment.clone(),
                    created_at: f.created_at.value(),
                })
                .collect();
            (
                StatusCode::OK,
                Json(FeedbackListResponse::success(summary, feedback)),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(FeedbackListResponse::error(e.to_string())),
        ),
    }
}

/// Append a note to a session. Participants only.
pub async fn note_create_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<NoteRequest>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    let result = registry.add_note(
        NoteId(Uuid::new_v4()),
        SessionId(id),
        user.id,
        &request.content,
        now(),
    );
    match result {
        Ok(note) => (
            StatusCode::CREATED,
            Json(NotesResponse::success(vec![NoteJson {
                id: note.id.to_string(),
                author: note.author.to_string(),
                content: note.content,
                created_at: note.created_at.value(),
            }])),
        ),
        Err(e) => (error_status(&e), Json(NotesResponse::error(e.to_string()))),
    }
}

/// All notes of a session in append order. Participants only.
pub async fn notes_list_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.notes(SessionId(id), user.id) {
        Ok(notes) => {
            let rows = notes
                .into_iter()
                .map(|n| NoteJson {
                    id: n.id.to_string(),
                    author: n.author.to_string(),
                    content: n.content,
                    created_at: n.created_at.value(),
                })
                .collect();
            (StatusCode::OK, Json(NotesResponse::success(rows)))
        }
        Err(e) => (error_status(&e), Json(NotesResponse::error(e.to_string()))),
    }
}

// =============================================================================
// ASSESSMENT HANDLERS
// =============================================================================

/// The assessment question bank, without answer keys.
pub async fn questions_handler() -> impl IntoResponse {
    let questions = Assessment::questions()
        .iter()
        .map(QuestionJson::from_question)
        .collect();
    Json(QuestionsResponse {
        success: true,
        questions,
    })
}

/// Submit an assessment sheet. Teachers only; any score unlocks hosting.
pub async fn assessment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<AssessmentRequest>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.submit_assessment(user.id, &request.answers, now()) {
        Ok(result) => {
            tracing::info!(user = %user.id, score = result.score, "assessment submitted");
            (
                StatusCode::OK,
                Json(AssessmentResponse::success(result.score, result.level)),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(AssessmentResponse::error(e.to_string())),
        ),
    }
}
