//! Domain model for the student store.
//!
//! # Invariants
//! - Every record is identified by a caller-assigned `StudentId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod student;
