//! # EdNova CLI Module
//!
//! This module implements the CLI interface for EdNova.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `register` - Register a user and print its identifier
//! - `sessions` - List sessions (the default command)
//! - `create` - Schedule a session
//! - `book` - Claim the student slot of a session
//! - `join` - Request admission to a session
//! - `complete` / `cancel` - Close out a session
//! - `feedback` - Rate a completed session
//! - `note` - Add or list session notes
//! - `questions` - Print the assessment question bank
//! - `assess` - Submit an assessment sheet
//! - `results` - Show a user's assessment history
//! - `prune` - Delete old cancelled sessions
//!
//! Commands that act as a principal take `--as <user-id>`; the CLI trusts
//! the local operator and skips the HTTP bearer-token layer.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use ednova_core::EdnovaError;
use std::path::PathBuf;
use uuid::Uuid;

pub use commands::*;
pub use config::ServeConfig;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// EdNova - Session Booking Server
///
/// A deterministic booking and lifecycle engine for one-on-one teaching
/// sessions. Every state change is a checked transition over durable records.
#[derive(Parser, Debug)]
#[command(name = "ednova")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the record database
    #[arg(short = 'D', long, global = true, default_value = "ednova.db")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (ephemeral)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML config file; explicit flags take precedence
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if the database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Register a user and print its identifier
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role: "teacher" or "student"
        #[arg(short, long)]
        role: String,
    },

    /// List all sessions, soonest first
    Sessions,

    /// Schedule a session (assessed teachers only)
    Create {
        /// Session title
        #[arg(short, long)]
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Scheduled start as unix epoch seconds
        #[arg(long)]
        at: i64,

        /// Planned length in minutes
        #[arg(long, default_value = "60")]
        duration: u32,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Claim the student slot of a session
    Book {
        /// Session identifier
        session: Uuid,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Request admission to a session
    Join {
        /// Session identifier
        session: Uuid,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Mark a session completed
    Complete {
        /// Session identifier
        session: Uuid,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Withdraw a session (host only)
    Cancel {
        /// Session identifier
        session: Uuid,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Rate a completed session
    Feedback {
        /// Session identifier
        session: Uuid,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Optional free-text comment
        #[arg(short, long)]
        comment: Option<String>,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Add a note to a session, or list its notes when no content is given
    Note {
        /// Session identifier
        session: Uuid,

        /// Note content; omit to list existing notes
        content: Option<String>,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Print the assessment question bank
    Questions,

    /// Submit an assessment sheet
    Assess {
        /// Chosen option indexes, comma-separated, one per question
        #[arg(short, long)]
        answers: String,

        /// Acting principal
        #[arg(long = "as", value_name = "USER_ID")]
        acting_as: Uuid,
    },

    /// Show a user's assessment history
    Results {
        /// User identifier
        user: Uuid,
    },

    /// Delete cancelled sessions scheduled before the given instant
    Prune {
        /// Cutoff as unix epoch seconds
        #[arg(long)]
        before: i64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), EdnovaError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port, config }) => {
            cmd_serve(&cli.database, backend, host, port, config).await
        }
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        Some(Commands::Register { name, role }) => {
            cmd_register(&cli.database, backend, json_mode, &name, &role)
        }
        Some(Commands::Sessions) | None => cmd_sessions(&cli.database, backend, json_mode),
        Some(Commands::Create {
            title,
            description,
            at,
            duration,
            acting_as,
        }) => cmd_create(
            &cli.database,
            backend,
            json_mode,
            &title,
            &description,
            at,
            duration,
            acting_as,
        ),
        Some(Commands::Book { session, acting_as }) => {
            cmd_book(&cli.database, backend, json_mode, session, acting_as)
        }
        Some(Commands::Join { session, acting_as }) => {
            cmd_join(&cli.database, backend, json_mode, session, acting_as)
        }
        Some(Commands::Complete { session, acting_as }) => {
            cmd_complete(&cli.database, backend, json_mode, session, acting_as)
        }
        Some(Commands::Cancel { session, acting_as }) => {
            cmd_cancel(&cli.database, backend, json_mode, session, acting_as)
        }
        Some(Commands::Feedback {
            session,
            rating,
            comment,
            acting_as,
        }) => cmd_feedback(
            &cli.database,
            backend,
            json_mode,
            session,
            rating,
            comment.as_deref(),
            acting_as,
        ),
        Some(Commands::Note {
            session,
            content,
            acting_as,
        }) => cmd_note(
            &cli.database,
            backend,
            json_mode,
            session,
            content.as_deref(),
            acting_as,
        ),
        Some(Commands::Questions) => cmd_questions(json_mode),
        Some(Commands::Assess { answers, acting_as }) => {
            cmd_assess(&cli.database, backend, json_mode, &answers, acting_as)
        }
        Some(Commands::Results { user }) => cmd_results(&cli.database, backend, json_mode, user),
        Some(Commands::Prune { before }) => {
            cmd_prune(&cli.database, backend, json_mode, before)
        }
    }
}
