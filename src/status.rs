//! Statuses classify the business context of a note, e.g. business, personal or tax.

use rusqlite::Connection;

use crate::{
    DatabaseId, Error,
    named::{
        NamedFilter, NamedInput, NamedRecord, create_named, create_named_table, get_named,
        list_named, update_named,
    },
    pagination::{Page, PageRequest},
    resource::Resource,
    soft_delete::{Scope, SoftDelete},
    validation::WriteMode,
};

const TABLE: &str = "status";

/// The status collection.
pub struct Status;

impl SoftDelete for Status {
    const TABLE: &'static str = TABLE;
    const LABEL: &'static str = "status";
}

impl Resource for Status {
    type Record = NamedRecord;
    type Input = NamedInput;
    type Filter = NamedFilter;

    fn list(
        filter: &NamedFilter,
        scope: Scope,
        request: PageRequest,
        connection: &Connection,
    ) -> Result<Page<NamedRecord>, Error> {
        list_named(TABLE, filter, scope, request, connection)
    }

    fn retrieve(id: DatabaseId, connection: &Connection) -> Result<NamedRecord, Error> {
        get_status(id, connection)
    }

    fn create(input: NamedInput, connection: &Connection) -> Result<NamedRecord, Error> {
        create_named(TABLE, Self::LABEL, input, connection)
    }

    fn update(
        id: DatabaseId,
        input: NamedInput,
        mode: WriteMode,
        connection: &Connection,
    ) -> Result<NamedRecord, Error> {
        update_named(TABLE, Self::LABEL, id, input, mode, connection)
    }
}

/// Get the active status `id`.
pub fn get_status(id: DatabaseId, connection: &Connection) -> Result<NamedRecord, Error> {
    get_named(TABLE, id, Scope::Active, connection)
}

/// Initialize the status table.
pub fn create_status_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_named_table(TABLE, connection)
}
