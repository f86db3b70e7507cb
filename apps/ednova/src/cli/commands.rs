//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Commands open the registry directly and act on it with the operator's
//! `--as` principal; there is no token layer on this path.

use crate::api;
use crate::cli::config::ServeConfig;
use ednova_core::{
    Assessment, EdnovaError, NoteId, Registry, Role, Session, SessionId, Timestamp, User, UserId,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Current wall-clock time as a timestamp.
fn now() -> Timestamp {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));
    Timestamp::from_unix(secs)
}

/// Open the registry over the selected backend.
pub fn open_registry(db_path: &Path, backend: &str) -> Result<Registry, EdnovaError> {
    match backend {
        "redb" => Registry::with_redb(db_path),
        "memory" => Ok(Registry::new()),
        other => Err(EdnovaError::Validation(format!(
            "Unknown backend '{other}', expected redb or memory"
        ))),
    }
}

/// One session as a printable line.
fn print_session(session: &Session) {
    let student = session
        .student
        .map_or_else(|| "open".to_string(), |s| s.to_string());
    println!(
        "{}  {:<9}  t={}  {}m  \"{}\"",
        session.id,
        session.status.to_string(),
        session.scheduled_time.value(),
        session.duration_minutes,
        session.title
    );
    println!("    host: {}  student: {}", session.host, student);
}

/// One session as a JSON value.
fn session_value(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "id": session.id.to_string(),
        "host": session.host.to_string(),
        "student": session.student.map(|s| s.to_string()),
        "title": session.title,
        "description": session.description,
        "scheduled_time": session.scheduled_time.value(),
        "duration_minutes": session.duration_minutes,
        "status": session.status.to_string(),
    })
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// Flag resolution: explicit CLI flags beat config-file values, which beat
/// the built-in defaults. The global `--database`/`--backend` flags carry
/// clap defaults, so the file value is used only when they were left at
/// those defaults.
pub async fn cmd_serve(
    db_path: &PathBuf,
    backend: &str,
    host: Option<String>,
    port: Option<u16>,
    config: Option<PathBuf>,
) -> Result<(), EdnovaError> {
    let file = match config {
        Some(path) => ServeConfig::load(&path)?,
        None => ServeConfig::default(),
    };

    let host = host
        .or(file.host)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = port.or(file.port).unwrap_or(8080);
    let database = if db_path == Path::new("ednova.db") {
        file.database.unwrap_or_else(|| db_path.clone())
    } else {
        db_path.clone()
    };
    let backend = if backend == "redb" {
        file.backend.unwrap_or_else(|| backend.to_string())
    } else {
        backend.to_string()
    };

    let registry = open_registry(&database, &backend)?;

    println!("EdNova Session Booking Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", database);
    println!();
    println!("Endpoints:");
    println!("  POST /auth/register        - Register and log in");
    println!("  POST /auth/login           - Obtain a bearer token");
    println!("  GET  /sessions             - List sessions");
    println!("  POST /sessions             - Schedule a session");
    println!("  POST /sessions/:id/book    - Claim the student slot");
    println!("  POST /sessions/:id/join    - Request admission");
    println!("  POST /assessment           - Submit an assessment");
    println!("  GET  /health               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, registry).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(db_path: &PathBuf, backend: &str, force: bool) -> Result<(), EdnovaError> {
    if backend != "redb" {
        return Err(EdnovaError::Validation(
            "Only the redb backend uses a database file".to_string(),
        ));
    }
    if db_path.exists() {
        if !force {
            return Err(EdnovaError::Validation(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| EdnovaError::Store(format!("Remove existing database: {}", e)))?;
    }

    let _registry = Registry::with_redb(db_path)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// REGISTER COMMAND
// =============================================================================

/// Register a user and print its identifier.
pub fn cmd_register(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    name: &str,
    role: &str,
) -> Result<(), EdnovaError> {
    let role: Role = role.parse()?;
    let name = name.trim();
    if name.is_empty() {
        return Err(EdnovaError::Validation("Name must not be empty".to_string()));
    }

    let mut registry = open_registry(db_path, backend)?;
    let user = User::new(UserId::new(Uuid::new_v4()), name, role);
    registry.register_user(&user)?;

    if json_mode {
        print_json(&serde_json::json!({
            "id": user.id.to_string(),
            "name": user.name,
            "role": user.role.to_string(),
        }));
        return Ok(());
    }

    println!("Registered {} '{}'", user.role, user.name);
    println!("  id: {}", user.id);
    Ok(())
}

// =============================================================================
// SESSIONS COMMAND
// =============================================================================

/// List all sessions, soonest first.
pub fn cmd_sessions(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), EdnovaError> {
    let registry = open_registry(db_path, backend)?;
    let sessions = registry.sessions()?;

    if json_mode {
        let rows: Vec<serde_json::Value> = sessions.iter().map(session_value).collect();
        print_json(&serde_json::json!({ "count": rows.len(), "sessions": rows }));
        return Ok(());
    }

    println!("EdNova Sessions");
    println!("===============");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for session in &sessions {
        print_session(session);
    }
    println!();
    println!("{} session(s)", sessions.len());
    Ok(())
}

// =============================================================================
// LIFECYCLE COMMANDS
// =============================================================================

/// Schedule a session.
#[allow(clippy::too_many_arguments)]
pub fn cmd_create(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    title: &str,
    description: &str,
    at: i64,
    duration: u32,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let session = registry.create_session(
        UserId::new(acting_as),
        SessionId::new(Uuid::new_v4()),
        title,
        description,
        Timestamp::from_unix(at),
        duration,
        now(),
    )?;

    if json_mode {
        print_json(&session_value(&session));
        return Ok(());
    }

    println!("Scheduled session:");
    print_session(&session);
    Ok(())
}

/// Claim the student slot of a session.
pub fn cmd_book(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let session = registry.book(SessionId::new(session), UserId::new(acting_as))?;

    if json_mode {
        print_json(&session_value(&session));
        return Ok(());
    }

    println!("Booked:");
    print_session(&session);
    Ok(())
}

/// Request admission to a session.
pub fn cmd_join(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let registry = open_registry(db_path, backend)?;
    let (verdict, room) = registry.join(SessionId::new(session), UserId::new(acting_as), now())?;

    if json_mode {
        print_json(&serde_json::json!({
            "admitted": verdict.is_admitted(),
            "verdict": serde_json::to_value(&verdict)
                .map_err(|e| EdnovaError::Serialization(e.to_string()))?,
            "room": room.as_ref().map(|r| r.as_str().to_string()),
        }));
        return Ok(());
    }

    if let Some(room) = room {
        println!("Admitted. Room:");
        println!("  {}", room.as_str());
    } else {
        println!("Refused: {:?}", verdict);
    }
    Ok(())
}

/// Mark a session completed.
pub fn cmd_complete(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let session = registry.complete(SessionId::new(session), UserId::new(acting_as))?;

    if json_mode {
        print_json(&session_value(&session));
        return Ok(());
    }

    println!("Completed:");
    print_session(&session);
    Ok(())
}

/// Withdraw a session.
pub fn cmd_cancel(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let session = registry.cancel(SessionId::new(session), UserId::new(acting_as))?;

    if json_mode {
        print_json(&session_value(&session));
        return Ok(());
    }

    println!("Cancelled:");
    print_session(&session);
    Ok(())
}

// =============================================================================
// FEEDBACK & NOTES COMMANDS
// =============================================================================

/// Rate a completed session.
#[allow(clippy::too_many_arguments)]
pub fn cmd_feedback(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    rating: u8,
    comment: Option<&str>,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let feedback = registry.submit_feedback(
        SessionId::new(session),
        UserId::new(acting_as),
        rating,
        comment,
        now(),
    )?;

    if json_mode {
        print_json(&serde_json::json!({
            "session": feedback.session.to_string(),
            "teacher": feedback.teacher.to_string(),
            "rating": feedback.rating,
            "comment": feedback.comment,
        }));
        return Ok(());
    }

    println!(
        "Recorded rating {} for teacher {}",
        feedback.rating, feedback.teacher
    );
    Ok(())
}

/// Add a note to a session, or list its notes.
pub fn cmd_note(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    session: Uuid,
    content: Option<&str>,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let session = SessionId::new(session);
    let principal = UserId::new(acting_as);

    if let Some(content) = content {
        let mut registry = open_registry(db_path, backend)?;
        let note = registry.add_note(
            NoteId::new(Uuid::new_v4()),
            session,
            principal,
            content,
            now(),
        )?;
        if json_mode {
            print_json(&serde_json::json!({
                "id": note.id.to_string(),
                "session": note.session.to_string(),
                "content": note.content,
            }));
        } else {
            println!("Added note {}", note.id);
        }
        return Ok(());
    }

    let registry = open_registry(db_path, backend)?;
    let notes = registry.notes(session, principal)?;

    if json_mode {
        let rows: Vec<serde_json::Value> = notes
            .iter()
            .map(|n| {
                serde_json::json!({
                    "id": n.id.to_string(),
                    "author": n.author.to_string(),
                    "content": n.content,
                    "created_at": n.created_at.value(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "count": rows.len(), "notes": rows }));
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }
    for note in &notes {
        println!("[t={}] {}: {}", note.created_at.value(), note.author, note.content);
    }
    Ok(())
}

// =============================================================================
// ASSESSMENT COMMANDS
// =============================================================================

/// Print the assessment question bank.
pub fn cmd_questions(json_mode: bool) -> Result<(), EdnovaError> {
    let questions = Assessment::questions();

    if json_mode {
        let rows: Vec<serde_json::Value> = questions
            .iter()
            .map(|q| serde_json::json!({ "prompt": q.prompt, "options": q.options }))
            .collect();
        print_json(&serde_json::json!({ "count": rows.len(), "questions": rows }));
        return Ok(());
    }

    for (i, question) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, question.prompt);
        for (j, option) in question.options.iter().enumerate() {
            println!("   [{}] {}", j, option);
        }
    }
    println!();
    println!("Answer with: ednova assess --answers <i0,i1,...> --as <user-id>");
    Ok(())
}

/// Submit an assessment sheet.
pub fn cmd_assess(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    answers: &str,
    acting_as: Uuid,
) -> Result<(), EdnovaError> {
    let answers: Vec<usize> = answers
        .split(',')
        .map(|s| {
            s.trim().parse::<usize>().map_err(|_| {
                EdnovaError::Validation(format!("Invalid answer index '{}'", s.trim()))
            })
        })
        .collect::<Result<_, _>>()?;

    let mut registry = open_registry(db_path, backend)?;
    let result = registry.submit_assessment(UserId::new(acting_as), &answers, now())?;

    if json_mode {
        print_json(&serde_json::json!({
            "score": result.score,
            "level": result.level.to_string(),
        }));
        return Ok(());
    }

    println!("Score: {}", result.score);
    println!("Level: {}", result.level);
    Ok(())
}

/// Show a user's assessment history.
pub fn cmd_results(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    user: Uuid,
) -> Result<(), EdnovaError> {
    let registry = open_registry(db_path, backend)?;
    let results = registry.assessment_results(UserId::new(user))?;

    if json_mode {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "score": r.score,
                    "level": r.level.to_string(),
                    "completed_at": r.completed_at.value(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "count": rows.len(), "results": rows }));
        return Ok(());
    }

    if results.is_empty() {
        println!("No assessment results.");
        return Ok(());
    }
    for result in &results {
        println!(
            "[t={}] score {} -> {}",
            result.completed_at.value(),
            result.score,
            result.level
        );
    }
    Ok(())
}

// =============================================================================
// MAINTENANCE COMMANDS
// =============================================================================

/// Delete cancelled sessions scheduled before the cutoff.
pub fn cmd_prune(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    before: i64,
) -> Result<(), EdnovaError> {
    let mut registry = open_registry(db_path, backend)?;
    let removed = registry.prune_cancelled(Timestamp::from_unix(before))?;
    if registry.is_persistent() {
        registry.compact()?;
    }

    if json_mode {
        print_json(&serde_json::json!({ "removed": removed }));
        return Ok(());
    }

    println!("Removed {} cancelled session(s)", removed);
    Ok(())
}
