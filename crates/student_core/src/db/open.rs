//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or named in-memory connections.
//! - Configure connection pragmas required by store behavior.
//! - Trigger schema migrations before returning a bootstrapped connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout set.
//! - Bootstrapped connections have migrations fully applied.
//! - `connect_*` never migrates; it expects a bootstrapped store.
//! - File paths are never interpreted as URIs.
//! - Memory stores use the `memdb` VFS, so writers wait on the busy timeout
//!   instead of failing with `SQLITE_LOCKED`.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{debug, error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Busy timeout applied when callers do not choose one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let path = resolve_file_path(path.as_ref())?;
    open_bootstrapped("file", busy_timeout, || {
        Connection::open_with_flags(&path, file_flags())
    })
}

/// Opens the in-memory database named `unit_name` and applies all pending
/// migrations.
///
/// Every connection opened with [`connect_memory`] for the same name sees the
/// same data while at least one of them stays open.
pub fn open_memory(unit_name: &str, busy_timeout: Duration) -> DbResult<Connection> {
    let uri = memory_uri(unit_name);
    open_bootstrapped("memory", busy_timeout, || {
        Connection::open_with_flags(uri.as_str(), memory_flags())
    })
}

/// Builds the SQLite URI for a named, process-wide in-memory database.
///
/// The leading `/` makes `memdb` share the database across connections.
pub fn memory_uri(unit_name: &str) -> String {
    format!("file:/{unit_name}?vfs=memdb")
}

/// Opens a session connection on an already bootstrapped database file.
pub fn connect_file(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let conn = Connection::open_with_flags(path, file_flags())?;
    configure_connection(&conn, busy_timeout)?;
    debug!("event=db_connect module=db status=ok mode=file");
    Ok(conn)
}

/// Opens a session connection on an already bootstrapped memory store.
pub fn connect_memory(unit_name: &str, busy_timeout: Duration) -> DbResult<Connection> {
    let conn = Connection::open_with_flags(memory_uri(unit_name), memory_flags())?;
    configure_connection(&conn, busy_timeout)?;
    debug!("event=db_connect module=db status=ok mode=memory");
    Ok(conn)
}

/// Makes `path` absolute against the current directory.
///
/// An absolute path never starts with `file:`, so SQLite cannot read it as a URI
/// even when it was built with URI filenames enabled globally.
pub fn resolve_file_path(path: &Path) -> DbResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn open_bootstrapped(
    mode: &'static str,
    busy_timeout: Duration,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let bootstrap = configure_connection(&conn, busy_timeout)
        .and_then(|()| apply_migrations(&mut conn));
    match bootstrap {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

fn file_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

fn memory_flags() -> OpenFlags {
    file_flags() | OpenFlags::SQLITE_OPEN_URI
}
