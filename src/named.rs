//! Storage for the flat reference tables that only carry a name and a description.
//!
//! Statuses and operation types share this shape and differ only in their table.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    DatabaseId, Error, FieldErrors,
    db::is_unique_violation,
    pagination::{Page, PageRequest},
    query::{Filter, Listing, order_by},
    soft_delete::{SOFT_DELETE_COLUMNS, Scope},
    timestamp::Timestamp,
    validation::{WriteMode, validate_name},
};

/// A row of a name-and-description reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub id: DatabaseId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
}

/// The request body for creating or updating a [NamedRecord].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NamedInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// The query parameters for listing a name-and-description table.
#[derive(Debug, Default, Deserialize)]
pub struct NamedFilter {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

const COLUMNS: &str = "r.id, r.name, r.description, r.created_at, r.is_deleted, r.deleted_at";

const ORDERING_FIELDS: [(&str, &str); 2] = [("name", "r.name"), ("created_at", "r.created_at")];

const SEARCH_COLUMNS: [&str; 2] = ["r.name", "r.description"];

/// Create `table` if it does not exist.
pub(crate) fn create_named_table(table: &str, connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            {SOFT_DELETE_COLUMNS}
        );"
    ))
}

/// Insert a row into `table` and return it.
///
/// # Errors
/// Returns a validation error on `name` if the name is taken, including by a
/// soft-deleted row.
pub(crate) fn insert_named(
    table: &str,
    label: &str,
    name: &str,
    description: &str,
    connection: &Connection,
) -> Result<NamedRecord, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO {table} (name, description, created_at) VALUES (?1, ?2, ?3)
            RETURNING id, name, description, created_at, is_deleted, deleted_at"
        ))?
        .query_row((name, description, Timestamp::now()), map_named_row)
        .map_err(|error| map_duplicate_name(error, label))
}

/// Get row `id` of `table` if it is in `scope`.
pub(crate) fn get_named(
    table: &str,
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<NamedRecord, Error> {
    let mut filter = Filter::scoped(scope, "r");
    filter.equals("r.id", Some(id));

    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM {table} r {}", filter.where_clause()),
            rusqlite::params_from_iter(filter.params()),
            map_named_row,
        )
        .map_err(Error::from)
}

/// Find a row of `table` by its exact name, in any scope.
pub(crate) fn find_named_by_name(
    table: &str,
    name: &str,
    connection: &Connection,
) -> Result<Option<NamedRecord>, Error> {
    match connection.query_row(
        &format!("SELECT {COLUMNS} FROM {table} r WHERE r.name = ?1"),
        [name],
        map_named_row,
    ) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// One page of the rows of `table` in `scope` matching `filter`.
pub(crate) fn list_named(
    table: &str,
    params: &NamedFilter,
    scope: Scope,
    request: PageRequest,
    connection: &Connection,
) -> Result<Page<NamedRecord>, Error> {
    let mut filter = Filter::scoped(scope, "r");
    filter.search(params.search.as_deref(), &SEARCH_COLUMNS);

    let from = format!("{table} r");

    Listing {
        columns: COLUMNS,
        from: &from,
        filter,
        order_by: order_by(
            params.ordering.as_deref(),
            &ORDERING_FIELDS,
            "r.name ASC",
            "r.id ASC",
        ),
    }
    .fetch_page(request, connection, map_named_row)
}

/// Validate `input` and insert it into `table`.
pub(crate) fn create_named(
    table: &str,
    label: &str,
    input: NamedInput,
    connection: &Connection,
) -> Result<NamedRecord, Error> {
    let mut errors = FieldErrors::new();
    let name = validate_name(input.name.as_deref(), None, &mut errors);
    errors.into_result()?;

    let name = name.unwrap_or_default();
    let description = input.description.unwrap_or_default();

    insert_named(table, label, &name, &description, connection)
}

/// Validate `input` and apply it to the active row `id` of `table`.
pub(crate) fn update_named(
    table: &str,
    label: &str,
    id: DatabaseId,
    input: NamedInput,
    mode: WriteMode,
    connection: &Connection,
) -> Result<NamedRecord, Error> {
    let current = get_named(table, id, Scope::Active, connection)?;

    let (current_name, current_description) = match mode {
        WriteMode::Full => (None, None),
        WriteMode::Partial => (Some(current.name.as_str()), Some(current.description.as_str())),
    };

    let mut errors = FieldErrors::new();
    let name = validate_name(input.name.as_deref(), current_name, &mut errors);
    errors.into_result()?;

    let name = name.unwrap_or_default();
    let description = input
        .description
        .or(current_description.map(str::to_owned))
        .unwrap_or_default();

    let record = connection
        .prepare(&format!(
            "UPDATE {table} SET name = ?1, description = ?2 WHERE id = ?3 AND is_deleted = 0
            RETURNING id, name, description, created_at, is_deleted, deleted_at"
        ))?
        .query_row((name, description, id), map_named_row)
        .map_err(|error| map_duplicate_name(error, label))?;

    tracing::debug!("Updated {label} {id}");

    Ok(record)
}

fn map_duplicate_name(error: rusqlite::Error, label: &str) -> Error {
    if is_unique_violation(&error) {
        Error::Validation(FieldErrors::single(
            "name",
            &format!("{label} with this name already exists."),
        ))
    } else {
        error.into()
    }
}

pub(crate) fn map_named_row(row: &Row) -> Result<NamedRecord, rusqlite::Error> {
    Ok(NamedRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        is_deleted: row.get(4)?,
        deleted_at: row.get(5)?,
    })
}
