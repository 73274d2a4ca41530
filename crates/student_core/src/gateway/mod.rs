//! Record store gateway: the long-lived session factory.
//!
//! # Responsibility
//! - Bootstrap the configured store once and keep it open.
//! - Hand out one [`Session`] per operation and take it back afterwards.
//! - Track sessions that were handed out and not yet released.
//!
//! # Invariants
//! - The store is migrated before the first session is handed out.
//! - After [`StoreGateway::shutdown`] every `acquire` fails with
//!   [`StoreError::GatewayClosed`].
//! - A memory store lives exactly as long as the gateway stays open.

use crate::config::{ConfigError, StoreConfig, StoreTarget};
use crate::db::{self, DbError};
use log::{error, info, warn};
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;

pub mod entity;
pub mod session;

pub use entity::Entity;
pub use session::{Outcome, Session, UnitOfWork};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by the gateway, its sessions, or repositories built on them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("record store `{unit_name}` is shut down")]
    GatewayClosed { unit_name: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl StoreError {
    /// Whether this failure is a primary-key collision reported by SQLite.
    pub fn is_primary_key_violation(&self) -> bool {
        match self {
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(inner, _))) => {
                inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}

/// Session factory shared by every repository of one store.
///
/// Holds a bootstrap connection for its whole lifetime; for memory stores that
/// connection is what keeps the data alive.
pub struct StoreGateway {
    config: StoreConfig,
    /// `config.target` with file paths made absolute.
    target: StoreTarget,
    factory: Mutex<Option<Connection>>,
    live_sessions: AtomicUsize,
}

impl StoreGateway {
    /// Opens the configured store and applies pending migrations.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let started_at = Instant::now();

        let opened = match &config.target {
            StoreTarget::File(path) => db::resolve_file_path(path).and_then(|path| {
                db::open_db(&path, config.busy_timeout).map(|conn| (conn, StoreTarget::File(path)))
            }),
            StoreTarget::Memory => db::open_memory(&config.unit_name, config.busy_timeout)
                .map(|conn| (conn, StoreTarget::Memory)),
        };

        let (conn, target) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                error!(
                    "event=gateway_open module=gateway status=error unit={} mode={} duration_ms={} error={}",
                    config.unit_name,
                    config.mode(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=gateway_open module=gateway status=ok unit={} mode={} duration_ms={}",
            config.unit_name,
            config.mode(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            config,
            target,
            factory: Mutex::new(Some(conn)),
            live_sessions: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a new session bound to this store.
    ///
    /// The caller must hand it back through [`StoreGateway::release`]; prefer
    /// [`StoreGateway::lease`], which does so on every exit path.
    ///
    /// # Errors
    /// - [`StoreError::GatewayClosed`] after [`StoreGateway::shutdown`].
    /// - [`StoreError::Db`] when the connection cannot be opened.
    pub fn acquire(&self) -> StoreResult<Session> {
        // Held across connect so shutdown cannot drop a memory store mid-acquire.
        let factory = self.factory();
        if factory.is_none() {
            warn!(
                "event=session_acquire module=gateway status=error unit={} error_code=gateway_closed",
                self.config.unit_name
            );
            return Err(StoreError::GatewayClosed {
                unit_name: self.config.unit_name.clone(),
            });
        }

        let conn = match &self.target {
            StoreTarget::File(path) => db::connect_file(path, self.config.busy_timeout)?,
            StoreTarget::Memory => {
                db::connect_memory(&self.config.unit_name, self.config.busy_timeout)?
            }
        };
        self.live_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Session::new(conn))
    }

    /// Acquires a session that is released when the returned guard drops,
    /// including during a panic.
    pub fn lease(&self) -> StoreResult<SessionLease<'_>> {
        let session = self.acquire()?;
        Ok(SessionLease {
            gateway: self,
            session: Some(session),
        })
    }

    /// Closes `session`. Close failures are logged and otherwise ignored.
    pub fn release(&self, session: Session) {
        self.live_sessions.fetch_sub(1, Ordering::SeqCst);
        if let Err(err) = session.close() {
            warn!(
                "event=session_release module=gateway status=error unit={} error={}",
                self.config.unit_name, err
            );
        }
    }

    /// Number of sessions acquired and not yet released.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    /// Closes the factory. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let Some(conn) = self.factory().take() else {
            return;
        };

        match conn.close() {
            Ok(()) => info!(
                "event=gateway_shutdown module=gateway status=ok unit={}",
                self.config.unit_name
            ),
            Err((_, err)) => warn!(
                "event=gateway_shutdown module=gateway status=error unit={} error={}",
                self.config.unit_name, err
            ),
        }
    }

    pub fn is_open(&self) -> bool {
        self.factory().is_some()
    }

    fn factory(&self) -> MutexGuard<'_, Option<Connection>> {
        self.factory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`Session`] that goes back to its gateway on drop.
pub struct SessionLease<'g> {
    gateway: &'g StoreGateway,
    session: Option<Session>,
}

impl Deref for SessionLease<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session.as_ref().expect("lease holds its session until drop")
    }
}

impl DerefMut for SessionLease<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session.as_mut().expect("lease holds its session until drop")
    }
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.gateway.release(session);
        }
    }
}
