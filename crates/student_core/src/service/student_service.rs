//! Student use-case service.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::gateway::StoreResult;
use crate::model::student::{Student, StudentId};
use crate::repo::student_repo::StudentRepository;

/// Use-case service wrapper for student CRUD operations.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds a student record from its parts and inserts it.
    ///
    /// Returns `Ok(false)` when `student_id` is already registered.
    pub fn register_student(
        &self,
        student_id: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> StoreResult<bool> {
        let student = Student::new(student_id, first_name, last_name);
        self.repo.insert_student(&student)
    }

    pub fn insert_student(&self, student: &Student) -> StoreResult<bool> {
        self.repo.insert_student(student)
    }

    pub fn fetch_student(&self, student_id: StudentId) -> StoreResult<Option<Student>> {
        self.repo.fetch_student(student_id)
    }

    pub fn delete_student(&self, student_id: StudentId) -> StoreResult<bool> {
        self.repo.delete_student(student_id)
    }

    pub fn update_student_first_name(
        &self,
        student_id: StudentId,
        first_name: &str,
    ) -> StoreResult<bool> {
        self.repo.update_student_first_name(student_id, first_name)
    }

    pub fn update_student_last_name(
        &self,
        student_id: StudentId,
        last_name: &str,
    ) -> StoreResult<bool> {
        self.repo.update_student_last_name(student_id, last_name)
    }
}
