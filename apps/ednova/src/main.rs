//! # EdNova - Session Booking Server
//!
//! The main binary for the EdNova tutoring platform.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for offline registry operations
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 apps/ednova (THE BINARY)                │
//! │                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │  Identity  │  │
//! │  │  (clap)     │    │   (axum)    │    │  Gateway   │  │
//! │  └──────┬──────┘    └──────┬──────┘    └─────┬──────┘  │
//! │         │                  │                 │         │
//! │         └──────────────────┼─────────────────┘         │
//! │                            ▼                           │
//! │                    ┌───────────────┐                   │
//! │                    │  ednova-core  │                   │
//! │                    │  (THE LOGIC)  │                   │
//! │                    └───────────────┘                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! ednova serve --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! ednova sessions
//! ednova register --name "Grace" --role teacher
//! ednova book <session-id> --as <user-id>
//! ```

use clap::Parser;
use ednova::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing. EDNOVA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("EDNOVA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ednova=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the EdNova startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗██████╗ ███╗   ██╗ ██████╗ ██╗   ██╗ █████╗
  ██╔════╝██╔══██╗████╗  ██║██╔═══██╗██║   ██║██╔══██╗
  █████╗  ██║  ██║██╔██╗ ██║██║   ██║██║   ██║███████║
  ██╔══╝  ██║  ██║██║╚██╗██║██║   ██║╚██╗ ██╔╝██╔══██║
  ███████╗██████╔╝██║ ╚████║╚██████╔╝ ╚████╔╝ ██║  ██║
  ╚══════╝╚═════╝ ╚═╝  ╚═══╝ ╚═════╝   ╚═══╝  ╚═╝  ╚═╝

  Session Booking Server v{}

  Deterministic • Single-assignment • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
