use clap::{Parser, Subcommand};
use std::path::PathBuf;
use student_core::StudentId;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Insert, fetch, update and delete student records",
    long_about = "Runs one student store operation against a SQLite file, or against a \
                  throwaway in-memory store when no database path is configured."
)]
pub struct Cli {
    #[arg(
        long = "db",
        env = "STUDENT_STORE_PATH",
        value_name = "PATH",
        help = "SQLite database file; omit to use an in-memory store"
    )]
    pub db_path: Option<PathBuf>,

    #[arg(
        long = "unit",
        env = "STUDENT_STORE_UNIT",
        default_value = student_core::config::DEFAULT_UNIT_NAME,
        value_name = "NAME",
        help = "Persistence unit name"
    )]
    pub unit_name: String,

    #[arg(
        long,
        env = "STUDENT_STORE_BUSY_TIMEOUT_MS",
        value_name = "MS",
        help = "How long a writer waits for another writer's lock"
    )]
    pub busy_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "STUDENT_LOG_LEVEL",
        default_value = student_core::default_log_level(),
        value_name = "LEVEL",
        help = "trace|debug|info|warn|error"
    )]
    pub log_level: String,

    #[arg(
        long,
        env = "STUDENT_LOG_DIR",
        value_name = "DIR",
        help = "Absolute directory for rotating log files; logs go to stderr when omitted"
    )]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a new student; prints `false` when the id already exists.
    Insert {
        id: StudentId,
        first_name: String,
        last_name: String,
    },
    /// Print one student as JSON.
    Fetch { id: StudentId },
    /// Delete one student.
    Delete { id: StudentId },
    /// Replace a student's first name.
    SetFirstName { id: StudentId, value: String },
    /// Replace a student's last name.
    SetLastName { id: StudentId, value: String },
    /// Insert, fetch, rename and delete a sample record.
    Demo,
}
