//! # redb-backed Record Store
//!
//! A disk-backed [`RecordStore`] using the redb embedded database,
//! providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Records are encoded with postcard. Conditional updates (`claim_student`,
//! `transition_status`, `insert_feedback`) run their check and write inside
//! one write transaction; redb's single-writer model makes the
//! read-check-write step atomic.

use crate::records::RecordStore;
use crate::types::{
    EdnovaError, Feedback, Note, Session, SessionId, SessionStatus, SkillLevel, SkillTestResult,
    User, UserId,
};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Table for users: UserId(u128) -> serialized User bytes
const USERS: TableDefinition<u128, &[u8]> = TableDefinition::new("users");

/// Table for sessions: SessionId(u128) -> serialized Session bytes
const SESSIONS: TableDefinition<u128, &[u8]> = TableDefinition::new("sessions");

/// Table for feedback: (session_id, student_id) -> serialized Feedback bytes.
/// The key is the uniqueness pair, so a plain occupancy check enforces
/// one-feedback-per-(session, student).
const FEEDBACK: TableDefinition<(u128, u128), &[u8]> = TableDefinition::new("feedback");

/// Table for notes: (session_id, seq) -> serialized Note bytes.
/// `seq` is a global monotone counter; a range scan over one session yields
/// its notes in append order.
const NOTES: TableDefinition<(u128, u64), &[u8]> = TableDefinition::new("notes");

/// Table for assessment results: (user_id, seq) -> serialized result bytes
const SKILL_RESULTS: TableDefinition<(u128, u64), &[u8]> = TableDefinition::new("skill_results");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NOTE_SEQ_KEY: &str = "note_seq";
const RESULT_SEQ_KEY: &str = "result_seq";

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EdnovaError> {
    postcard::to_allocvec(value).map_err(|e| EdnovaError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EdnovaError> {
    postcard::from_bytes(bytes).map_err(|e| EdnovaError::Serialization(e.to_string()))
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Next append sequence for notes.
    note_seq: u64,
    /// Next append sequence for assessment results.
    result_seq: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("note_seq", &self.note_seq)
            .field("result_seq", &self.result_seq)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EdnovaError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| EdnovaError::Store(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(USERS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(SESSIONS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(FEEDBACK)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(NOTES)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(SKILL_RESULTS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }

        // Load append counters
        let read_txn = db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let meta = read_txn
            .open_table(METADATA)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let note_seq = meta
            .get(NOTE_SEQ_KEY)
            .map_err(|e| EdnovaError::Store(e.to_string()))?
            .map(|v| v.value())
            .unwrap_or(0);
        let result_seq = meta
            .get(RESULT_SEQ_KEY)
            .map_err(|e| EdnovaError::Store(e.to_string()))?
            .map(|v| v.value())
            .unwrap_or(0);

        Ok(Self {
            db,
            note_seq,
            result_seq,
        })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), EdnovaError> {
        self.db
            .compact()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }

    fn read_user(&self, id: UserId) -> Result<Option<User>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(USERS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        match table
            .get(id.as_u128())
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn read_session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        match table
            .get(id.as_u128())
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn all_sessions(&self) -> Result<Vec<Session>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let mut rows = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            let (_, bytes) = entry.map_err(|e| EdnovaError::Store(e.to_string()))?;
            rows.push(decode(bytes.value())?);
        }
        Ok(rows)
    }

    /// Mutate one session under the write transaction, enforcing the
    /// mutation's own precondition. The closure's error aborts the
    /// transaction; nothing is committed on failure.
    fn update_session(
        &mut self,
        id: SessionId,
        apply: impl FnOnce(&mut Session) -> Result<(), EdnovaError>,
    ) -> Result<(), EdnovaError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let mut session: Session = match table
                .get(id.as_u128())
                .map_err(|e| EdnovaError::Store(e.to_string()))?
            {
                Some(bytes) => decode(bytes.value())?,
                None => return Err(EdnovaError::SessionNotFound(id)),
            };
            apply(&mut session)?;
            let bytes = encode(&session)?;
            table
                .insert(id.as_u128(), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }
}

impl RecordStore for RedbStore {
    fn insert_user(&mut self, user: &User) -> Result<(), EdnovaError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(USERS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let taken = table
                .get(user.id.as_u128())
                .map_err(|e| EdnovaError::Store(e.to_string()))?
                .is_some();
            if taken {
                return Err(EdnovaError::Conflict(format!(
                    "User {} already registered",
                    user.id
                )));
            }
            let bytes = encode(user)?;
            table
                .insert(user.id.as_u128(), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, EdnovaError> {
        self.read_user(id)
    }

    fn set_skill_level(&mut self, id: UserId, level: SkillLevel) -> Result<(), EdnovaError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(USERS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let mut user: User = match table
                .get(id.as_u128())
                .map_err(|e| EdnovaError::Store(e.to_string()))?
            {
                Some(bytes) => decode(bytes.value())?,
                None => return Err(EdnovaError::UserNotFound(id)),
            };
            user.skill_level = Some(level);
            let bytes = encode(&user)?;
            table
                .insert(id.as_u128(), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }

    fn insert_session(&mut self, session: &Session) -> Result<(), EdnovaError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let taken = table
                .get(session.id.as_u128())
                .map_err(|e| EdnovaError::Store(e.to_string()))?
                .is_some();
            if taken {
                return Err(EdnovaError::Conflict(format!(
                    "Session {} already exists",
                    session.id
                )));
            }
            let bytes = encode(session)?;
            table
                .insert(session.id.as_u128(), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }

    fn session(&self, id: SessionId) -> Result<Option<Session>, EdnovaError> {
        self.read_session(id)
    }

    fn sessions_by_time(&self) -> Result<Vec<Session>, EdnovaError> {
        let mut rows = self.all_sessions()?;
        rows.sort_by_key(|s| (s.scheduled_time, s.id));
        Ok(rows)
    }

    fn sessions_for_user(&self, user: UserId) -> Result<Vec<Session>, EdnovaError> {
        let mut rows = self.all_sessions()?;
        rows.retain(|s| s.is_participant(user));
        rows.sort_by_key(|s| (s.scheduled_time, s.id));
        Ok(rows)
    }

    fn claim_student(&mut self, id: SessionId, student: UserId) -> Result<(), EdnovaError> {
        self.update_session(id, |session| {
            if session.status != SessionStatus::Scheduled {
                return Err(EdnovaError::State(session.status));
            }
            if session.student.is_some() {
                return Err(EdnovaError::Conflict(
                    "Session is already booked".to_string(),
                ));
            }
            session.student = Some(student);
            Ok(())
        })
    }

    fn transition_status(&mut self, id: SessionId, to: SessionStatus) -> Result<(), EdnovaError> {
        if !to.is_terminal() {
            return Err(EdnovaError::Validation(format!(
                "Illegal transition target: {to}"
            )));
        }
        self.update_session(id, |session| {
            if session.status.is_terminal() {
                return Err(EdnovaError::State(session.status));
            }
            session.status = to;
            Ok(())
        })
    }

    fn remove_session(&mut self, id: SessionId) -> Result<bool, EdnovaError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let existed;
        {
            let mut table = write_txn
                .open_table(SESSIONS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            existed = table
                .remove(id.as_u128())
                .map_err(|e| EdnovaError::Store(e.to_string()))?
                .is_some();
            // Dependent notes go with the record.
            let mut notes = write_txn
                .open_table(NOTES)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let mut keys: Vec<(u128, u64)> = Vec::new();
            for entry in notes
                .range((id.as_u128(), 0)..=(id.as_u128(), u64::MAX))
                .map_err(|e| EdnovaError::Store(e.to_string()))?
            {
                let (key, _) = entry.map_err(|e| EdnovaError::Store(e.to_string()))?;
                keys.push(key.value());
            }
            for key in keys {
                notes
                    .remove(key)
                    .map_err(|e| EdnovaError::Store(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(existed)
    }

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<(), EdnovaError> {
        let key = (feedback.session.as_u128(), feedback.student.as_u128());
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(FEEDBACK)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let taken = table
                .get(key)
                .map_err(|e| EdnovaError::Store(e.to_string()))?
                .is_some();
            if taken {
                return Err(EdnovaError::Conflict(
                    "Feedback already submitted for this session".to_string(),
                ));
            }
            let bytes = encode(feedback)?;
            table
                .insert(key, bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(())
    }

    fn feedback_for_teacher(&self, teacher: UserId) -> Result<Vec<Feedback>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(FEEDBACK)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let mut rows: Vec<Feedback> = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            let (_, bytes) = entry.map_err(|e| EdnovaError::Store(e.to_string()))?;
            let feedback: Feedback = decode(bytes.value())?;
            if feedback.teacher == teacher {
                rows.push(feedback);
            }
        }
        rows.sort_by_key(|f| (std::cmp::Reverse(f.created_at), f.session));
        Ok(rows)
    }

    fn insert_note(&mut self, note: &Note) -> Result<(), EdnovaError> {
        let seq = self.note_seq;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(NOTES)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let bytes = encode(note)?;
            table
                .insert((note.session.as_u128(), seq), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let mut meta = write_txn
                .open_table(METADATA)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            meta.insert(NOTE_SEQ_KEY, seq.saturating_add(1))
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        self.note_seq = seq.saturating_add(1);
        Ok(())
    }

    fn notes_for_session(&self, id: SessionId) -> Result<Vec<Note>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(NOTES)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let mut rows = Vec::new();
        for entry in table
            .range((id.as_u128(), 0)..=(id.as_u128(), u64::MAX))
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            let (_, bytes) = entry.map_err(|e| EdnovaError::Store(e.to_string()))?;
            rows.push(decode(bytes.value())?);
        }
        Ok(rows)
    }

    fn insert_skill_result(&mut self, result: &SkillTestResult) -> Result<(), EdnovaError> {
        let seq = self.result_seq;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SKILL_RESULTS)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let bytes = encode(result)?;
            table
                .insert((result.user.as_u128(), seq), bytes.as_slice())
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            let mut meta = write_txn
                .open_table(METADATA)
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
            meta.insert(RESULT_SEQ_KEY, seq.saturating_add(1))
                .map_err(|e| EdnovaError::Store(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        self.result_seq = seq.saturating_add(1);
        Ok(())
    }

    fn skill_results_for_user(&self, user: UserId) -> Result<Vec<SkillTestResult>, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(SKILL_RESULTS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let mut rows = Vec::new();
        for entry in table
            .range((user.as_u128(), 0)..=(user.as_u128(), u64::MAX))
            .map_err(|e| EdnovaError::Store(e.to_string()))?
        {
            let (_, bytes) = entry.map_err(|e| EdnovaError::Store(e.to_string()))?;
            rows.push(decode(bytes.value())?);
        }
        Ok(rows)
    }

    fn user_count(&self) -> Result<usize, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(USERS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let len = table
            .len()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(len as usize)
    }

    fn session_count(&self) -> Result<usize, EdnovaError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let table = read_txn
            .open_table(SESSIONS)
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        let len = table
            .len()
            .map_err(|e| EdnovaError::Store(e.to_string()))?;
        Ok(len as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
