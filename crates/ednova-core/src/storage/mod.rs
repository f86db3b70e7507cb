//! # Persistent Storage
//!
//! Disk-backed record storage built on redb.

mod redb_store;

pub use redb_store::RedbStore;
