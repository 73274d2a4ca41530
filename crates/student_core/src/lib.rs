//! Data-access layer for student records.
//!
//! A [`StoreGateway`] owns the store and hands out one session per call; the
//! [`SqliteStudentRepository`] runs each CRUD operation inside its own
//! session and transaction.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig, StoreTarget};
pub use gateway::{
    Entity, Outcome, Session, SessionLease, StoreError, StoreGateway, StoreResult, UnitOfWork,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogDestination,
    LoggingError,
};
pub use model::student::{Student, StudentId};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use service::student_service::StudentService;
