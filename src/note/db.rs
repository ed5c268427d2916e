//! Database operations for notes.

use rusqlite::{Connection, Row, types::Value};

use crate::{
    DatabaseId, Error, FieldErrors,
    category::get_category_link,
    note::{
        NewNote, NoteFilter, NoteInput, NoteRecord,
        amount::{format_amount, from_minor_units, to_minor_units, validate_amount},
        consistency::check_classification,
    },
    pagination::{Page, PageRequest},
    query::{Filter, Listing, order_by, parse_date_filter, parse_id_filter},
    resource::Resource,
    soft_delete::{SOFT_DELETE_COLUMNS, Scope, SoftDelete},
    status::Status,
    subcategory::get_subcategory_link,
    timestamp::{INVALID_DATETIME_MESSAGE, Timestamp},
    transaction_type::TransactionType,
    validation::{WriteMode, invalid_reference_message, require_reference},
};

/// The note collection.
pub struct Note;

impl SoftDelete for Note {
    const TABLE: &'static str = "note";
    const LABEL: &'static str = "note";
}

const COLUMNS: &str = "n.id, n.created_date, n.status_id, n.type_id, n.category_id, \
    n.subcategory_id, n.amount, n.comment, n.created_at, n.updated_at, n.is_deleted, \
    n.deleted_at, s.name, t.name, c.name, sc.name";

pub(super) const FROM: &str = "note n \
    INNER JOIN status s ON s.id = n.status_id \
    INNER JOIN operation_type t ON t.id = n.type_id \
    INNER JOIN category c ON c.id = n.category_id \
    INNER JOIN subcategory sc ON sc.id = n.subcategory_id";

const ORDERING_FIELDS: [(&str, &str); 3] = [
    ("created_date", "n.created_date"),
    ("amount", "n.amount"),
    ("created_at", "n.created_at"),
];

const DEFAULT_ORDERING: &str = "n.created_date DESC";

const TIE_BREAKER: &str = "n.id DESC";

impl Resource for Note {
    type Record = NoteRecord;
    type Input = NoteInput;
    type Filter = NoteFilter;

    fn list(
        params: &NoteFilter,
        scope: Scope,
        request: PageRequest,
        connection: &Connection,
    ) -> Result<Page<NoteRecord>, Error> {
        Listing {
            columns: COLUMNS,
            from: FROM,
            filter: note_filter(params, scope)?,
            order_by: order_by(
                params.ordering.as_deref(),
                &ORDERING_FIELDS,
                DEFAULT_ORDERING,
                TIE_BREAKER,
            ),
        }
        .fetch_page(request, connection, map_row)
    }

    fn retrieve(id: DatabaseId, connection: &Connection) -> Result<NoteRecord, Error> {
        get_note(id, connection)
    }

    fn create(input: NoteInput, connection: &Connection) -> Result<NoteRecord, Error> {
        let note = validate_input(input, WriteMode::Full, None, connection)?;

        insert_note(&note, connection)
    }

    fn update(
        id: DatabaseId,
        input: NoteInput,
        mode: WriteMode,
        connection: &Connection,
    ) -> Result<NoteRecord, Error> {
        let current = get_note(id, connection)?;
        let note = validate_input(input, mode, Some(&current), connection)?;

        let rows_affected = connection.execute(
            "UPDATE note SET created_date = ?1, status_id = ?2, type_id = ?3, category_id = ?4,
                subcategory_id = ?5, amount = ?6, comment = ?7, updated_at = ?8
            WHERE id = ?9 AND is_deleted = 0",
            (
                note.created_date,
                note.status_id,
                note.type_id,
                note.category_id,
                note.subcategory_id,
                to_minor_units(note.amount),
                &note.comment,
                Timestamp::now(),
                id,
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        tracing::debug!("Updated note {id}");

        get_note(id, connection)
    }
}

/// The WHERE clause for the notes in `scope` that match `params`.
///
/// # Errors
/// Returns a field-scoped [Error::Validation] if an ID or date filter cannot be parsed.
pub(super) fn note_filter(params: &NoteFilter, scope: Scope) -> Result<Filter, Error> {
    let mut filter = Filter::scoped(scope, "n");

    filter.equals("n.status_id", parse_id_filter("status", params.status_id.as_deref())?);
    filter.equals("n.type_id", parse_id_filter("type", params.type_id.as_deref())?);
    filter.equals(
        "n.category_id",
        parse_id_filter("category", params.category_id.as_deref())?,
    );
    filter.equals(
        "n.subcategory_id",
        parse_id_filter("subcategory", params.subcategory_id.as_deref())?,
    );
    filter.search(params.search.as_deref(), &["n.comment"]);

    // The stored text starts with the UTC date, so comparing prefixes compares days.
    if let Some(start_date) = parse_date_filter("start_date", params.start_date.as_deref())? {
        filter.push("substr(n.created_date, 1, 10) >= ?", [Value::Text(start_date)]);
    }

    if let Some(end_date) = parse_date_filter("end_date", params.end_date.as_deref())? {
        filter.push("substr(n.created_date, 1, 10) <= ?", [Value::Text(end_date)]);
    }

    Ok(filter)
}

/// Validate `input` against the database.
///
/// For [WriteMode::Partial], fields missing from `input` keep their value in
/// `current`, and the merged note is what gets checked. Whatever the mode, a
/// missing `created_date` keeps the stored date, or defaults to now on create.
fn validate_input(
    input: NoteInput,
    mode: WriteMode,
    current: Option<&NoteRecord>,
    connection: &Connection,
) -> Result<NewNote, Error> {
    let stored = match mode {
        WriteMode::Full => None,
        WriteMode::Partial => current,
    };

    let mut errors = FieldErrors::new();

    let created_date = match input.created_date.as_deref() {
        Some(raw) => Timestamp::parse_input(raw).or_else(|| {
            errors.add("created_date", INVALID_DATETIME_MESSAGE);
            None
        }),
        None => Some(
            current
                .map(|note| note.created_date)
                .unwrap_or_else(Timestamp::now),
        ),
    };

    let status_id = require_reference(
        "status",
        input.status_id,
        stored.map(|note| note.status_id),
        &mut errors,
    );
    let type_id = require_reference(
        "type",
        input.type_id,
        stored.map(|note| note.type_id),
        &mut errors,
    );
    let category_id = require_reference(
        "category",
        input.category_id,
        stored.map(|note| note.category_id),
        &mut errors,
    );
    let subcategory_id = require_reference(
        "subcategory",
        input.subcategory_id,
        stored.map(|note| note.subcategory_id),
        &mut errors,
    );

    let amount = validate_amount(
        input.amount.as_ref(),
        stored.map(|note| note.amount),
        &mut errors,
    );

    // Ids carried over from the stored note were valid when written; their
    // parents may have been soft-deleted since.
    let scope_of = |given: Option<DatabaseId>| match given {
        Some(_) => Scope::Active,
        None => Scope::All,
    };

    if let Some(status_id) = status_id
        && !Status::exists(status_id, scope_of(input.status_id), connection)?
    {
        errors.add("status", &invalid_reference_message(status_id));
    }

    if let Some(type_id) = type_id
        && !TransactionType::exists(type_id, scope_of(input.type_id), connection)?
    {
        errors.add("type", &invalid_reference_message(type_id));
    }

    let category = match category_id {
        Some(category_id) => {
            let link = get_category_link(category_id, scope_of(input.category_id), connection)?;
            if link.is_none() {
                errors.add("category", &invalid_reference_message(category_id));
            }
            link
        }
        None => None,
    };

    let subcategory = match subcategory_id {
        Some(subcategory_id) => {
            let link =
                get_subcategory_link(subcategory_id, scope_of(input.subcategory_id), connection)?;
            if link.is_none() {
                errors.add("subcategory", &invalid_reference_message(subcategory_id));
            }
            link
        }
        None => None,
    };

    errors.into_result()?;

    let (
        Some(created_date),
        Some(status_id),
        Some(type_id),
        Some(category),
        Some(subcategory),
        Some(amount),
    ) = (created_date, status_id, type_id, category, subcategory, amount)
    else {
        // Every missing value has recorded an error above.
        return Err(Error::Validation(FieldErrors::new()));
    };

    check_classification(type_id, category, subcategory).into_result()?;

    let comment = input
        .comment
        .or_else(|| stored.map(|note| note.comment.clone()))
        .unwrap_or_default();

    Ok(NewNote {
        created_date,
        status_id,
        type_id,
        category_id: category.id,
        subcategory_id: subcategory.id,
        amount,
        comment,
    })
}

/// Insert a validated note and return it.
///
/// # Errors
/// Returns [Error::ProtectedReference] if a referenced row does not exist.
pub fn insert_note(note: &NewNote, connection: &Connection) -> Result<NoteRecord, Error> {
    let now = Timestamp::now();

    connection.execute(
        "INSERT INTO note (created_date, status_id, type_id, category_id, subcategory_id,
            amount, comment, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        (
            note.created_date,
            note.status_id,
            note.type_id,
            note.category_id,
            note.subcategory_id,
            to_minor_units(note.amount),
            &note.comment,
            now,
        ),
    )?;

    let id = connection.last_insert_rowid();
    tracing::debug!("Inserted note {id}");

    get_note_in_scope(id, Scope::All, connection)
}

/// Get the active note `id`.
pub fn get_note(id: DatabaseId, connection: &Connection) -> Result<NoteRecord, Error> {
    get_note_in_scope(id, Scope::Active, connection)
}

fn get_note_in_scope(
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<NoteRecord, Error> {
    let mut filter = Filter::scoped(scope, "n");
    filter.equals("n.id", Some(id));

    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM {FROM} {}", filter.where_clause()),
            rusqlite::params_from_iter(filter.params()),
            map_row,
        )
        .map_err(Error::from)
}

/// Initialize the note table and indexes.
///
/// Notes protect the rows they refer to: deleting a referenced status, type,
/// category or subcategory fails.
pub fn create_note_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS note (
            id INTEGER PRIMARY KEY,
            created_date TEXT NOT NULL,
            status_id INTEGER NOT NULL,
            type_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            subcategory_id INTEGER NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 1),
            comment TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            {SOFT_DELETE_COLUMNS},
            FOREIGN KEY(status_id) REFERENCES status(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(type_id) REFERENCES operation_type(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(subcategory_id) REFERENCES subcategory(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_note_created_date ON note(created_date);
        CREATE INDEX IF NOT EXISTS idx_note_status ON note(status_id);
        CREATE INDEX IF NOT EXISTS idx_note_type ON note(type_id);
        CREATE INDEX IF NOT EXISTS idx_note_category ON note(category_id);
        CREATE INDEX IF NOT EXISTS idx_note_subcategory ON note(subcategory_id);"
    ))
}

fn map_row(row: &Row) -> Result<NoteRecord, rusqlite::Error> {
    let created_date: Timestamp = row.get(1)?;
    let amount = from_minor_units(row.get(6)?);

    Ok(NoteRecord {
        id: row.get(0)?,
        created_date,
        status_id: row.get(2)?,
        type_id: row.get(3)?,
        category_id: row.get(4)?,
        subcategory_id: row.get(5)?,
        amount,
        comment: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        is_deleted: row.get(10)?,
        deleted_at: row.get(11)?,
        status_name: row.get(12)?,
        type_name: row.get(13)?,
        category_name: row.get(14)?,
        subcategory_name: row.get(15)?,
        formatted_amount: format_amount(amount),
        formatted_date: created_date.format_display(),
    })
}
