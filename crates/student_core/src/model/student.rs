//! Student domain model.
//!
//! # Invariants
//! - `student_id` is assigned by the caller and never generated by the store.
//! - Name fields are stored as given; no trimming or validation happens here.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Caller-assigned primary key of a student record.
pub type StudentId = i64;

/// The single persisted entity of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    pub fn new(
        student_id: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            student_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Replaces the first name, leaving the last name untouched.
    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
    }

    /// Replaces the last name, leaving the first name untouched.
    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
    }
}

impl Display for Student {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Student [studentId={}, firstName={}, lastName={}]",
            self.student_id, self.first_name, self.last_name
        )
    }
}
