//! Session handle and unit-of-work scope.
//!
//! # Responsibility
//! - Wrap one SQLite connection handed out by the gateway.
//! - Run a closure inside a write transaction and settle it.
//!
//! # Invariants
//! - A transaction opened by [`Session::transact`] is always committed or
//!   rolled back before `transact` returns.
//! - Any error raised inside the scope rolls the transaction back before it
//!   reaches the caller.
//! - Write transactions start with `BEGIN IMMEDIATE`.

use super::entity::{self, Entity};
use super::StoreResult;
use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// How a unit of work wants its transaction settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Commit(T),
    Rollback(T),
}

/// One unit-of-work handle bound to its own connection.
pub struct Session {
    conn: Connection,
}

impl Session {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Looks up one entity outside of any explicit transaction.
    pub fn find<E: Entity>(&self, id: E::Id) -> StoreResult<Option<E>> {
        entity::find(&self.conn, id)
    }

    /// Runs `work` inside an immediate write transaction.
    ///
    /// The transaction is committed or rolled back according to the returned
    /// [`Outcome`]. An `Err` from `work` or from commit rolls back first and is
    /// then returned unchanged.
    pub fn transact<T, F>(&mut self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&UnitOfWork<'_>) -> StoreResult<Outcome<T>>,
    {
        let unit = UnitOfWork {
            tx: self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?,
        };

        let result = work(&unit);
        match result {
            Ok(Outcome::Commit(value)) => {
                // A failed COMMIT leaves the transaction open; dropping it rolls back.
                unit.tx.commit()?;
                debug!("event=tx_end module=session status=ok action=commit");
                Ok(value)
            }
            Ok(Outcome::Rollback(value)) => {
                unit.tx.rollback()?;
                debug!("event=tx_end module=session status=ok action=rollback");
                Ok(value)
            }
            Err(err) => {
                match unit.tx.rollback() {
                    Ok(()) => warn!(
                        "event=tx_end module=session status=error action=rollback error={}",
                        err
                    ),
                    Err(rollback_err) => error!(
                        "event=tx_end module=session status=error action=rollback error={} rollback_error={}",
                        err, rollback_err
                    ),
                }
                Err(err)
            }
        }
    }

    pub fn is_transaction_active(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Closes the underlying connection.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// Entity operations scoped to one open transaction.
pub struct UnitOfWork<'s> {
    tx: Transaction<'s>,
}

impl UnitOfWork<'_> {
    pub fn find<E: Entity>(&self, id: E::Id) -> StoreResult<Option<E>> {
        entity::find(&self.tx, id)
    }

    pub fn persist<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        entity::persist(&self.tx, entity)
    }

    /// Writes all non-key fields of `entity`. Returns `false` when no row matched.
    pub fn update<E: Entity>(&self, entity: &E) -> StoreResult<bool> {
        entity::update(&self.tx, entity)
    }

    /// Deletes the row of `entity`. Returns `false` when no row matched.
    pub fn remove<E: Entity>(&self, entity: &E) -> StoreResult<bool> {
        entity::remove(&self.tx, entity)
    }

    pub fn is_active(&self) -> bool {
        !self.tx.is_autocommit()
    }
}
