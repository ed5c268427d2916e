#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{get_test_server, get_test_server_with_state};

use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    DatabaseId,
    category::{CategoryRecord, insert_category},
    db::initialize,
    named::{NamedRecord, insert_named},
    note::{NewNote, NoteRecord, insert_note},
    subcategory::{SubcategoryRecord, insert_subcategory},
    timestamp::Timestamp,
    transaction_type::{INFLOW_TYPE_NAME, OUTFLOW_TYPE_NAME},
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn create_test_status(name: &str, connection: &Connection) -> NamedRecord {
    insert_named("status", "status", name, "", connection).expect("Could not create test status")
}

#[track_caller]
pub(crate) fn create_test_type(name: &str, connection: &Connection) -> NamedRecord {
    insert_named("operation_type", "type", name, "", connection)
        .expect("Could not create test type")
}

#[track_caller]
pub(crate) fn create_test_category(
    name: &str,
    type_id: DatabaseId,
    connection: &Connection,
) -> CategoryRecord {
    insert_category(name, type_id, "", connection).expect("Could not create test category")
}

#[track_caller]
pub(crate) fn create_test_subcategory(
    name: &str,
    category_id: DatabaseId,
    connection: &Connection,
) -> SubcategoryRecord {
    insert_subcategory(name, category_id, "", connection)
        .expect("Could not create test subcategory")
}

/// One consistent branch of the taxonomy for each direction of money flow.
pub(crate) struct TestTaxonomy {
    pub status: NamedRecord,
    pub inflow: NamedRecord,
    pub outflow: NamedRecord,
    /// A category of `inflow`.
    pub income: CategoryRecord,
    /// A subcategory of `income`.
    pub sales: SubcategoryRecord,
    /// A category of `outflow`.
    pub infrastructure: CategoryRecord,
    /// A subcategory of `infrastructure`.
    pub vps: SubcategoryRecord,
}

#[track_caller]
pub(crate) fn create_test_taxonomy(connection: &Connection) -> TestTaxonomy {
    let status = create_test_status("Бизнес", connection);
    let inflow = create_test_type(INFLOW_TYPE_NAME, connection);
    let outflow = create_test_type(OUTFLOW_TYPE_NAME, connection);
    let income = create_test_category("Доходы", inflow.id, connection);
    let sales = create_test_subcategory("Продажи", income.id, connection);
    let infrastructure = create_test_category("Инфраструктура", outflow.id, connection);
    let vps = create_test_subcategory("VPS", infrastructure.id, connection);

    TestTaxonomy {
        status,
        inflow,
        outflow,
        income,
        sales,
        infrastructure,
        vps,
    }
}

/// Insert a note of `amount` on `date` (`YYYY-MM-DD`).
///
/// Inflow notes are filed under income/sales and outflow notes under
/// infrastructure/VPS. The comment is the name of the note's type.
#[track_caller]
pub(crate) fn create_test_note(
    taxonomy: &TestTaxonomy,
    is_inflow: bool,
    amount: &str,
    date: &str,
    connection: &Connection,
) -> NoteRecord {
    let (operation_type, category, subcategory) = if is_inflow {
        (&taxonomy.inflow, &taxonomy.income, &taxonomy.sales)
    } else {
        (&taxonomy.outflow, &taxonomy.infrastructure, &taxonomy.vps)
    };

    let note = NewNote {
        created_date: Timestamp::parse_input(date).expect("Invalid test date"),
        status_id: taxonomy.status.id,
        type_id: operation_type.id,
        category_id: category.id,
        subcategory_id: subcategory.id,
        amount: Decimal::from_str(amount).expect("Invalid test amount"),
        comment: operation_type.name.clone(),
    };

    insert_note(&note, connection).expect("Could not create test note")
}
