//! Command-line front end for the student store.
//!
//! # Responsibility
//! - Own the gateway lifecycle: open once, run one command, shut down.
//! - Print boolean results as `true`/`false` and records as JSON.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use log::info;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use student_core::{
    init_logging, init_stderr_logging, SqliteStudentRepository, StoreConfig, StoreGateway,
    StudentId, StudentService,
};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(&cli.log_level, dir),
        None => init_stderr_logging(&cli.log_level),
    };
    logging.context("failed to initialize logging")?;

    let gateway =
        StoreGateway::open(store_config(&cli)).context("failed to open student store")?;
    let gateway = Arc::new(gateway);
    let service = StudentService::new(SqliteStudentRepository::new(Arc::clone(&gateway)));

    let result = execute(&service, &cli.command);
    gateway.shutdown();
    let status = if result.is_ok() { "ok" } else { "error" };
    info!("event=cli_exit module=cli status={status}");
    result
}

fn store_config(cli: &Cli) -> StoreConfig {
    let config = match &cli.db_path {
        Some(path) => StoreConfig::file(cli.unit_name.clone(), path),
        None => StoreConfig::in_memory(cli.unit_name.clone()),
    };
    match cli.busy_timeout_ms {
        Some(millis) => config.with_busy_timeout(Duration::from_millis(millis)),
        None => config,
    }
}

fn execute(service: &StudentService<SqliteStudentRepository>, command: &Command) -> Result<()> {
    match command {
        Command::Insert {
            id,
            first_name,
            last_name,
        } => {
            let inserted = service.register_student(*id, first_name.as_str(), last_name.as_str())?;
            println!("{inserted}");
        }
        Command::Fetch { id } => print_student(service, *id)?,
        Command::Delete { id } => println!("{}", service.delete_student(*id)?),
        Command::SetFirstName { id, value } => {
            println!("{}", service.update_student_first_name(*id, value)?)
        }
        Command::SetLastName { id, value } => {
            println!("{}", service.update_student_last_name(*id, value)?)
        }
        Command::Demo => run_demo(service)?,
    }
    Ok(())
}

fn print_student(service: &StudentService<SqliteStudentRepository>, id: StudentId) -> Result<()> {
    match service.fetch_student(id)? {
        Some(student) => println!("{}", serde_json::to_string(&student)?),
        None => println!("No Student found with provided ID"),
    }
    Ok(())
}

fn run_demo(service: &StudentService<SqliteStudentRepository>) -> Result<()> {
    const DEMO_ID: StudentId = 1026;

    println!("insert: {}", service.register_student(DEMO_ID, "Navya", "Bade")?);
    print_student(service, DEMO_ID)?;
    println!(
        "update first name: {}",
        service.update_student_first_name(DEMO_ID, "Teja")?
    );
    print_student(service, DEMO_ID)?;
    println!("delete: {}", service.delete_student(DEMO_ID)?);
    print_student(service, DEMO_ID)?;
    Ok(())
}
