//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite mapping details from service orchestration.
//!
//! # Invariants
//! - Absence and duplicate ids are ordinary return values; only store
//!   failures are errors.

pub mod student_repo;
