//! Wire-shape tests for the API request/response types.
//!
//! These pin the JSON contract the frontend depends on, independent of the
//! handlers that produce it.

#![allow(clippy::unwrap_used, clippy::panic)]

use ednova::api::{
    AuthResponse, CreateSessionRequest, JoinResponse, QuestionJson, RegisterRequest, SessionJson,
};
use ednova_core::{
    JoinVerdict, Role, RoomRef, Session, SessionId, SessionStatus, Timestamp, User, UserId,
};
use serde_json::json;
use uuid::Uuid;

fn sample_session() -> Session {
    Session::new(
        SessionId::from_u128(10),
        UserId::from_u128(1),
        "Intro to fractions",
        "One-on-one walkthrough",
        Timestamp::from_unix(5_000),
        60,
        RoomRef::new("https://meet.jit.si/ednova-room"),
    )
}

// =============================================================================
// SESSION JSON
// =============================================================================

#[test]
fn session_json_omits_the_room() {
    let session = sample_session();
    let mut host = User::new(UserId::from_u128(1), "Grace", Role::Teacher);
    host.skill_level = Some(ednova_core::SkillLevel::Advanced);

    let value = serde_json::to_value(SessionJson::from_session(&session, Some(&host))).unwrap();

    assert_eq!(value["title"], "Intro to fractions");
    assert_eq!(value["host_name"], "Grace");
    assert_eq!(value["host_skill_level"], "Advanced");
    assert_eq!(value["scheduled_time"], 5_000);
    assert_eq!(value["status"], "scheduled");
    assert_eq!(value["student"], serde_json::Value::Null);
    assert!(value.get("room").is_none());
}

#[test]
fn session_json_without_host_profile() {
    let mut session = sample_session();
    session.status = SessionStatus::Cancelled;

    let value = serde_json::to_value(SessionJson::from_session(&session, None)).unwrap();

    assert_eq!(value["host_name"], serde_json::Value::Null);
    assert_eq!(value["status"], "cancelled");
}

// =============================================================================
// REQUEST DEFAULTS
// =============================================================================

#[test]
fn create_request_description_defaults_empty() {
    let request: CreateSessionRequest = serde_json::from_value(json!({
        "title": "Algebra",
        "scheduled_time": 5_000,
        "duration_minutes": 45,
    }))
    .unwrap();

    assert_eq!(request.description, "");
    assert_eq!(request.duration_minutes, 45);
}

#[test]
fn register_request_name_is_optional() {
    let request: RegisterRequest = serde_json::from_value(json!({
        "email": "grace@example.com",
        "secret": "longenough",
        "role": "teacher",
    }))
    .unwrap();

    assert!(request.name.is_none());
}

// =============================================================================
// JOIN VERDICT WIRE FORMAT
// =============================================================================

#[test]
fn join_response_inlines_refusal_verdicts() {
    let verdict = JoinVerdict::TooEarly {
        scheduled_time: Timestamp::from_unix(9_000),
    };
    let value = serde_json::to_value(JoinResponse::from_verdict(verdict, None)).unwrap();

    assert_eq!(value["admitted"], false);
    assert_eq!(value["verdict"]["verdict"], "too_early");
    assert_eq!(value["room"], serde_json::Value::Null);
}

#[test]
fn join_response_drops_verdict_on_admission() {
    let value = serde_json::to_value(JoinResponse::from_verdict(
        JoinVerdict::Admitted,
        Some("https://meet.jit.si/ednova-room".to_string()),
    ))
    .unwrap();

    assert_eq!(value["admitted"], true);
    assert_eq!(value["verdict"], serde_json::Value::Null);
    assert_eq!(value["room"], "https://meet.jit.si/ednova-room");
}

#[test]
fn not_scheduled_verdict_carries_the_status() {
    let verdict = JoinVerdict::NotScheduled {
        status: SessionStatus::Completed,
    };
    let value = serde_json::to_value(&verdict).unwrap();

    assert_eq!(value["verdict"], "not_scheduled");
    assert_eq!(value["status"], "completed");
}

// =============================================================================
// AUTH & QUESTION SHAPES
// =============================================================================

#[test]
fn auth_response_success_shape() {
    let user = User::new(UserId(Uuid::new_v4()), "Sam", Role::Student);
    let value = serde_json::to_value(AuthResponse::success("tok-123", &user)).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["token"], "tok-123");
    assert_eq!(value["user"]["role"], "student");
    assert_eq!(value["error"], serde_json::Value::Null);
}

#[test]
fn question_json_has_no_answer_key() {
    let question = ednova_core::Assessment::questions().first().unwrap();
    let value = serde_json::to_value(QuestionJson::from_question(question)).unwrap();

    assert!(value.get("prompt").is_some());
    assert_eq!(value["options"].as_array().unwrap().len(), 4);
    assert!(value.get("correct").is_none());
}
