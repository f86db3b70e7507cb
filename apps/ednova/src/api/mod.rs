//! # EdNova HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Public Endpoints
//!
//! - `GET  /health` - Health check
//! - `POST /auth/register` - Register and log in
//! - `POST /auth/login` - Exchange credentials for a bearer token
//! - `GET  /sessions` - Public session listing
//! - `GET  /sessions/{id}` - Public session detail
//! - `GET  /teachers/{id}/feedback` - A teacher's received feedback
//!
//! ## Protected Endpoints (bearer token)
//!
//! - `GET  /me` - Authenticated principal
//! - `GET  /me/sessions` - The principal's sessions
//! - `POST /auth/logout` - Revoke the presented token
//! - `POST /sessions` - Create a session (assessed teachers)
//! - `POST /sessions/{id}/book` - Claim the student slot
//! - `POST /sessions/{id}/join` - Join inside the window
//! - `POST /sessions/{id}/complete` - Mark completed
//! - `POST /sessions/{id}/cancel` - Withdraw (host only)
//! - `POST /sessions/{id}/feedback` - Rate a completed session
//! - `GET/POST /sessions/{id}/notes` - Session notes (participants)
//! - `GET  /assessment/questions` - Question bank
//! - `POST /assessment` - Submit an assessment sheet
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `EDNOVA_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `EDNOVA_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::LocalGateway;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `ednova::api::*`)
pub use handlers::{
    assessment_handler, book_handler, cancel_handler, complete_handler, create_session_handler,
    feedback_handler, health_handler, join_handler, list_sessions_handler, login_handler,
    logout_handler, me_handler, my_sessions_handler, note_create_handler, notes_list_handler,
    questions_handler, register_handler, session_detail_handler, teacher_feedback_handler,
};
pub use types::{
    AssessmentRequest, AssessmentResponse, AuthResponse, CreateSessionRequest, FeedbackJson,
    FeedbackListResponse, FeedbackRequest, HealthResponse, JoinResponse, LoginRequest,
    MySessionsQuery, NoteJson, NoteRequest, NotesResponse, QuestionJson, QuestionsResponse,
    RegisterRequest, SessionJson, SessionResponse, SessionsResponse, UserJson, UserResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use ednova_core::{EdnovaError, Registry};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the booking registry and the identity gateway.
#[derive(Clone)]
pub struct AppState {
    /// The booking registry over its store backend.
    pub registry: Arc<RwLock<Registry>>,
    /// Credential and token storage.
    pub gateway: Arc<RwLock<LocalGateway>>,
}

impl AppState {
    /// Create new app state around a registry.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            gateway: Arc::new(RwLock::new(LocalGateway::new())),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `EDNOVA_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("EDNOVA_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (EDNOVA_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in EDNOVA_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No EDNOVA_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against abuse (if enabled)
/// 4. Bearer auth - protected routes only
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Reads that need no principal: listings, detail, teacher feedback.
    let public = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route("/sessions", get(handlers::list_sessions_handler))
        .route("/sessions/{id}", get(handlers::session_detail_handler))
        .route(
            "/teachers/{id}/feedback",
            get(handlers::teacher_feedback_handler),
        );

    // Everything that acts as a principal requires a bearer token.
    let protected = Router::new()
        .route("/me", get(handlers::me_handler))
        .route("/me/sessions", get(handlers::my_sessions_handler))
        .route("/auth/logout", post(handlers::logout_handler))
        .route("/sessions", post(handlers::create_session_handler))
        .route("/sessions/{id}/book", post(handlers::book_handler))
        .route(
            "/sessions/{id}/join",
            get(handlers::join_handler).post(handlers::join_handler),
        )
        .route("/sessions/{id}/complete", post(handlers::complete_handler))
        .route("/sessions/{id}/cancel", post(handlers::cancel_handler))
        .route("/sessions/{id}/feedback", post(handlers::feedback_handler))
        .route(
            "/sessions/{id}/notes",
            get(handlers::notes_list_handler).post(handlers::note_create_handler),
        )
        .route("/assessment/questions", get(handlers::questions_handler))
        .route("/assessment", post(handlers::assessment_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::bearer_auth_middleware,
        ));

    let mut router = public.merge(protected);

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, registry: Registry) -> Result<(), EdnovaError> {
    let state = AppState::new(registry);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EdnovaError::Store(format!("Bind failed: {}", e)))?;

    tracing::info!("EdNova HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| EdnovaError::Store(format!("Server error: {}", e)))
}
