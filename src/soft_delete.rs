//! Soft-delete, shared by every table in the database.
//!
//! Rows are never removed through the API. Deleting a row sets its
//! `is_deleted` flag and `deleted_at` timestamp, and restoring it clears both.
//! Default reads only see rows where the flag is clear.
//!
//! Deleting a parent does not touch its children: a soft-deleted category
//! keeps its subcategories and notes exactly as they were.

use rusqlite::Connection;

use crate::{DatabaseId, Error, timestamp::Timestamp};

/// Which rows a query should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Rows that have not been soft-deleted. The default for every read.
    Active,
    /// Only soft-deleted rows.
    Deleted,
    /// Every row regardless of its flag, for administrative access.
    All,
}

impl Scope {
    /// The SQL predicate for this scope on the table aliased as `alias`.
    pub fn predicate(self, alias: &str) -> Option<String> {
        match self {
            Scope::Active => Some(format!("{alias}.is_deleted = 0")),
            Scope::Deleted => Some(format!("{alias}.is_deleted = 1")),
            Scope::All => None,
        }
    }
}

/// The SQL column definitions every soft-deletable table carries.
pub const SOFT_DELETE_COLUMNS: &str =
    "is_deleted INTEGER NOT NULL DEFAULT 0 CHECK (is_deleted IN (0, 1)),
    deleted_at TEXT";

/// A table whose rows can be soft-deleted and restored.
pub trait SoftDelete {
    /// The name of the SQL table.
    const TABLE: &'static str;

    /// A human readable name for log messages.
    const LABEL: &'static str;

    /// Flag the active row `id` as deleted.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no active row with that ID.
    fn soft_delete(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
        let rows_affected = connection.execute(
            &format!(
                "UPDATE {} SET is_deleted = 1, deleted_at = ?1 WHERE id = ?2 AND is_deleted = 0",
                Self::TABLE
            ),
            (Timestamp::now(), id),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        tracing::info!("Soft-deleted {} {id}", Self::LABEL);

        Ok(())
    }

    /// Clear the deleted flag and timestamp of row `id`.
    ///
    /// Restoring a row that is not deleted succeeds and changes nothing.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no row with that ID.
    fn restore(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
        let rows_affected = connection.execute(
            &format!(
                "UPDATE {} SET is_deleted = 0, deleted_at = NULL WHERE id = ?1",
                Self::TABLE
            ),
            [id],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        tracing::info!("Restored {} {id}", Self::LABEL);

        Ok(())
    }

    /// Whether `id` refers to a row in `scope`.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if the query fails.
    fn exists(id: DatabaseId, scope: Scope, connection: &Connection) -> Result<bool, Error> {
        let predicate = scope
            .predicate(Self::TABLE)
            .map(|predicate| format!("AND {predicate}"))
            .unwrap_or_default();

        connection
            .query_row(
                &format!(
                    "SELECT EXISTS (SELECT 1 FROM {table} WHERE {table}.id = ?1 {predicate})",
                    table = Self::TABLE
                ),
                [id],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }
}
