//! Entity mapping contract and the generic SQL it drives.
//!
//! # Responsibility
//! - Describe how a record maps onto one table keyed by one id column.
//! - Provide find/persist/update/remove primitives over any connection.
//!
//! # Invariants
//! - `COLUMNS` and `Entity::values` list non-key columns in the same order.
//! - Primitives never begin or end transactions themselves.

use super::StoreResult;
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::fmt::Display;

/// Record type mapped to a single table.
pub trait Entity: Sized {
    /// Identifier type bound to `ID_COLUMN`.
    type Id: ToSql + Copy + Display + 'static;

    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Non-key columns, in bind order.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Self::Id;

    /// Values for `COLUMNS`, in the same order.
    fn values(&self) -> Vec<&dyn ToSql>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub(crate) fn find<E: Entity>(conn: &Connection, id: E::Id) -> StoreResult<Option<E>> {
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} = ?1;",
        E::ID_COLUMN,
        E::COLUMNS.join(", "),
        E::TABLE,
        E::ID_COLUMN
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let found = stmt.query_row([id], E::from_row).optional()?;
    Ok(found)
}

pub(crate) fn persist<E: Entity>(conn: &Connection, entity: &E) -> StoreResult<()> {
    let placeholders = (1..=E::COLUMNS.len() + 1)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ({});",
        E::TABLE,
        E::ID_COLUMN,
        E::COLUMNS.join(", "),
        placeholders
    );

    let id = entity.id();
    let mut bind: Vec<&dyn ToSql> = vec![&id as &dyn ToSql];
    bind.extend(entity.values());
    conn.prepare_cached(&sql)?.execute(params_from_iter(bind))?;
    Ok(())
}

/// Writes every non-key column of `entity`. Returns whether a row matched.
pub(crate) fn update<E: Entity>(conn: &Connection, entity: &E) -> StoreResult<bool> {
    let assignments = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?1;",
        E::TABLE,
        assignments,
        E::ID_COLUMN
    );

    let id = entity.id();
    let mut bind: Vec<&dyn ToSql> = vec![&id as &dyn ToSql];
    bind.extend(entity.values());
    let changed = conn.prepare_cached(&sql)?.execute(params_from_iter(bind))?;
    Ok(changed > 0)
}

/// Deletes the row of `entity`. Returns whether a row matched.
pub(crate) fn remove<E: Entity>(conn: &Connection, entity: &E) -> StoreResult<bool> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1;", E::TABLE, E::ID_COLUMN);
    let changed = conn.prepare_cached(&sql)?.execute([entity.id()])?;
    Ok(changed > 0)
}
