//! # ednova-core
//!
//! The deterministic booking engine for EdNova - THE LOGIC.
//!
//! This crate implements the CORE of the platform: a session booking and
//! lifecycle state machine for one-on-one teaching sessions, with the
//! access gate, skill assessment, and feedback recorder around it.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where records exist (stateful)
//! - Is closed: no external logic may be injected
//! - Is minimal: if a rule is not essential to the booking lifecycle, it
//!   is removed
//! - Never reads a clock; every time-gated operation takes the caller's
//!   `now`
//! - Has NO async, NO network dependencies, NO float arithmetic

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod assessment;
pub mod lifecycle;
pub mod primitives;
pub mod recorder;
pub mod records;
pub mod registry;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    EdnovaError, Feedback, Note, NoteId, Role, RoomRef, Session, SessionId, SessionStatus,
    SkillLevel, SkillTestResult, Timestamp, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use access::{AccessGate, Capability};
pub use assessment::{Assessment, Question};
pub use lifecycle::{JoinVerdict, Lifecycle};
pub use recorder::{RatingSummary, Recorder};
pub use records::{MemoryStore, RecordStore};
pub use registry::{Registry, StoreBackend};
pub use storage::RedbStore;
