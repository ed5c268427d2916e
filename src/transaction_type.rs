//! Operation types give the direction of a money movement: inflow or outflow.

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

const TABLE: &str = "operation_type";

/// The name of the type for money coming in.
pub const INFLOW_TYPE_NAME: &str = "Пополнение";

/// The name of the type for money going out.
pub const OUTFLOW_TYPE_NAME: &str = "Списание";

/// The operation type collection.
pub struct TransactionType;

impl SoftDelete for TransactionType {
    const TABLE: &'static str = TABLE;
    const LABEL: &'static str = "type";
}

impl Resource for TransactionType {
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
        get_named(TABLE, id, Scope::Active, connection)
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

/// Initialize the operation type table.
pub fn create_type_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_named_table(TABLE, connection)
}
