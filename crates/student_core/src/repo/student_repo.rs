//! Student repository contract and gateway-backed implementation.
//!
//! # Responsibility
//! - Provide the five student CRUD operations over the `students` table.
//! - Keep column mapping inside the persistence boundary.
//!
//! # Invariants
//! - Every operation leases its own session; the lease releases it on every
//!   exit path, including unwinding.
//! - Write operations read and write inside one immediate transaction.
//! - Missing ids and duplicate inserts are `Ok(false)` / `Ok(None)`, never errors.
//! - Store failures roll back, then surface as `Err(StoreError)`.

use crate::gateway::{Entity, Outcome, Session, StoreGateway, StoreResult};
use crate::model::student::{Student, StudentId};
use log::{debug, error, warn};
use rusqlite::types::ToSql;
use rusqlite::Row;
use std::sync::Arc;
use std::time::Instant;

impl Entity for Student {
    type Id = StudentId;

    const TABLE: &'static str = "students";
    const ID_COLUMN: &'static str = "student_id";
    const COLUMNS: &'static [&'static str] = &["first_name", "last_name"];

    fn id(&self) -> StudentId {
        self.student_id
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        vec![&self.first_name as &dyn ToSql, &self.last_name]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            student_id: row.get("student_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
        })
    }
}

/// Repository interface for student records.
pub trait StudentRepository {
    /// Persists `student` unless its id is already taken.
    ///
    /// Returns `Ok(false)` without touching the stored row on a duplicate id.
    fn insert_student(&self, student: &Student) -> StoreResult<bool>;
    /// Looks up one student. Absence is `Ok(None)`.
    fn fetch_student(&self, student_id: StudentId) -> StoreResult<Option<Student>>;
    /// Removes one student. Returns `Ok(false)` when the id is unknown.
    fn delete_student(&self, student_id: StudentId) -> StoreResult<bool>;
    /// Replaces the first name only. Returns `Ok(false)` when the id is unknown.
    fn update_student_first_name(&self, student_id: StudentId, first_name: &str)
        -> StoreResult<bool>;
    /// Replaces the last name only. Returns `Ok(false)` when the id is unknown.
    fn update_student_last_name(&self, student_id: StudentId, last_name: &str)
        -> StoreResult<bool>;
}

/// Student repository backed by a shared [`StoreGateway`].
#[derive(Clone)]
pub struct SqliteStudentRepository {
    gateway: Arc<StoreGateway>,
}

impl SqliteStudentRepository {
    pub fn new(gateway: Arc<StoreGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<StoreGateway> {
        &self.gateway
    }

    fn with_session<T>(
        &self,
        operation: &'static str,
        student_id: StudentId,
        run: impl FnOnce(&mut Session) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let mut session = match self.gateway.lease() {
            Ok(session) => session,
            Err(err) => {
                error!(
                    "event={} module=repo status=error student_id={} error_code=acquire_failed error={}",
                    operation, student_id, err
                );
                return Err(err);
            }
        };

        let result = run(&mut *session);
        drop(session);

        match &result {
            Ok(_) => debug!(
                "event={} module=repo status=ok student_id={} duration_ms={}",
                operation,
                student_id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={} module=repo status=error student_id={} duration_ms={} error={}",
                operation,
                student_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn update_field(
        &self,
        operation: &'static str,
        student_id: StudentId,
        apply: impl FnOnce(&mut Student),
    ) -> StoreResult<bool> {
        self.with_session(operation, student_id, |session| {
            session.transact(|unit| {
                let Some(mut student) = unit.find::<Student>(student_id)? else {
                    return Ok(Outcome::Rollback(false));
                };
                apply(&mut student);
                if unit.update(&student)? {
                    Ok(Outcome::Commit(true))
                } else {
                    Ok(Outcome::Rollback(false))
                }
            })
        })
    }
}

impl StudentRepository for SqliteStudentRepository {
    fn insert_student(&self, student: &Student) -> StoreResult<bool> {
        let student_id = student.student_id;
        self.with_session("student_insert", student_id, |session| {
            session.transact(|unit| {
                if unit.find::<Student>(student_id)?.is_some() {
                    warn!(
                        "event=student_insert module=repo status=conflict student_id={}",
                        student_id
                    );
                    return Ok(Outcome::Rollback(false));
                }

                match unit.persist(student) {
                    Ok(()) => Ok(Outcome::Commit(true)),
                    Err(err) if err.is_primary_key_violation() => {
                        warn!(
                            "event=student_insert module=repo status=conflict student_id={} error_code=primary_key",
                            student_id
                        );
                        Ok(Outcome::Rollback(false))
                    }
                    Err(err) => Err(err),
                }
            })
        })
    }

    fn fetch_student(&self, student_id: StudentId) -> StoreResult<Option<Student>> {
        self.with_session("student_fetch", student_id, |session| {
            session.find::<Student>(student_id)
        })
    }

    fn delete_student(&self, student_id: StudentId) -> StoreResult<bool> {
        self.with_session("student_delete", student_id, |session| {
            session.transact(|unit| {
                let Some(student) = unit.find::<Student>(student_id)? else {
                    return Ok(Outcome::Rollback(false));
                };
                if unit.remove(&student)? {
                    Ok(Outcome::Commit(true))
                } else {
                    Ok(Outcome::Rollback(false))
                }
            })
        })
    }

    fn update_student_first_name(
        &self,
        student_id: StudentId,
        first_name: &str,
    ) -> StoreResult<bool> {
        self.update_field("student_update_first_name", student_id, |student| {
            student.set_first_name(first_name)
        })
    }

    fn update_student_last_name(
        &self,
        student_id: StudentId,
        last_name: &str,
    ) -> StoreResult<bool> {
        self.update_field("student_update_last_name", student_id, |student| {
            student.set_last_name(last_name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStudentRepository;
    use crate::config::StoreConfig;
    use crate::gateway::{StoreGateway, StoreResult};
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;

    #[test]
    fn session_is_released_when_an_operation_panics() {
        let gateway = StoreGateway::open(StoreConfig::in_memory("repo-unit-unwind")).unwrap();
        let repo = SqliteStudentRepository::new(Arc::new(gateway));

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: StoreResult<()> =
                repo.with_session("student_fetch", 1, |_session| panic!("mapping blew up"));
        }));

        assert!(unwound.is_err());
        assert_eq!(repo.gateway().live_sessions(), 0);
    }
}
