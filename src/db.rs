//! Database setup shared by every model.

use rusqlite::{Connection, Error, Transaction, TransactionBehavior, functions::FunctionFlags};

use crate::{
    category::create_category_table, note::create_note_table, status::create_status_table,
    subcategory::create_subcategory_table, transaction_type::create_type_table,
};

/// The name of the SQL function used for case-insensitive search.
///
/// SQLite's built-in `lower` and `LIKE` only fold ASCII letters, which is no
/// use for Cyrillic names.
pub(crate) const CASEFOLD_FUNCTION: &str = "casefold";

/// Create the tables for all domain models and configure the connection.
///
/// This is safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table could not be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    register_casefold(connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_status_table(&transaction)?;
    create_type_table(&transaction)?;
    create_category_table(&transaction)?;
    create_subcategory_table(&transaction)?;
    create_note_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Whether `error` is a violated UNIQUE constraint.
pub(crate) fn is_unique_violation(error: &Error) -> bool {
    matches!(
        error,
        Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn register_casefold(connection: &Connection) -> Result<(), Error> {
    connection.create_scalar_function(
        CASEFOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;

            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}
