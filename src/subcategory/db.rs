//! Database operations for subcategories.

use rusqlite::{Connection, Row};

use crate::{
    DatabaseId, Error, FieldErrors,
    category::Category,
    db::is_unique_violation,
    pagination::{Page, PageRequest},
    query::{Filter, Listing, order_by, parse_id_filter},
    resource::Resource,
    soft_delete::{SOFT_DELETE_COLUMNS, Scope, SoftDelete},
    subcategory::{SubcategoryFilter, SubcategoryInput, SubcategoryLink, SubcategoryRecord},
    timestamp::Timestamp,
    validation::{
        NON_FIELD_ERRORS, WriteMode, invalid_reference_message, require_reference, validate_name,
    },
};

/// The subcategory collection.
pub struct Subcategory;

impl SoftDelete for Subcategory {
    const TABLE: &'static str = "subcategory";
    const LABEL: &'static str = "subcategory";
}

const COLUMNS: &str = "s.id, s.category_id, c.name, t.name, s.name, s.description, \
    s.created_at, s.is_deleted, s.deleted_at";

const FROM: &str = "subcategory s \
    INNER JOIN category c ON c.id = s.category_id \
    INNER JOIN operation_type t ON t.id = c.type_id";

const ORDERING_FIELDS: [(&str, &str); 2] = [("name", "s.name"), ("created_at", "s.created_at")];

const DEFAULT_ORDERING: &str = "s.name ASC";

const TIE_BREAKER: &str = "s.id ASC";

const DUPLICATE_MESSAGE: &str = "The fields category, name must make a unique set.";

impl Resource for Subcategory {
    type Record = SubcategoryRecord;
    type Input = SubcategoryInput;
    type Filter = SubcategoryFilter;

    fn list(
        params: &SubcategoryFilter,
        scope: Scope,
        request: PageRequest,
        connection: &Connection,
    ) -> Result<Page<SubcategoryRecord>, Error> {
        let mut filter = Filter::scoped(scope, "s");
        filter.equals(
            "s.category_id",
            parse_id_filter("category", params.category_id.as_deref())?,
        );
        filter.search(params.search.as_deref(), &["s.name", "s.description"]);

        Listing {
            columns: COLUMNS,
            from: FROM,
            filter,
            order_by: order_by(
                params.ordering.as_deref(),
                &ORDERING_FIELDS,
                DEFAULT_ORDERING,
                TIE_BREAKER,
            ),
        }
        .fetch_page(request, connection, map_row)
    }

    fn retrieve(id: DatabaseId, connection: &Connection) -> Result<SubcategoryRecord, Error> {
        get_subcategory(id, connection)
    }

    fn create(
        input: SubcategoryInput,
        connection: &Connection,
    ) -> Result<SubcategoryRecord, Error> {
        let (name, category_id, description) = validate_input(input, None, connection)?;

        insert_subcategory(&name, category_id, &description, connection)
    }

    fn update(
        id: DatabaseId,
        input: SubcategoryInput,
        mode: WriteMode,
        connection: &Connection,
    ) -> Result<SubcategoryRecord, Error> {
        let current = get_subcategory(id, connection)?;
        let current = match mode {
            WriteMode::Full => None,
            WriteMode::Partial => Some(&current),
        };

        let (name, category_id, description) = validate_input(input, current, connection)?;

        let rows_affected = connection
            .execute(
                "UPDATE subcategory SET name = ?1, category_id = ?2, description = ?3
                WHERE id = ?4 AND is_deleted = 0",
                (name, category_id, description, id),
            )
            .map_err(map_duplicate)?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        tracing::debug!("Updated subcategory {id}");

        get_subcategory(id, connection)
    }
}

fn validate_input(
    input: SubcategoryInput,
    current: Option<&SubcategoryRecord>,
    connection: &Connection,
) -> Result<(String, DatabaseId, String), Error> {
    let mut errors = FieldErrors::new();

    let name = validate_name(
        input.name.as_deref(),
        current.map(|subcategory| subcategory.name.as_str()),
        &mut errors,
    );
    let category_id = require_reference(
        "category",
        input.category_id,
        current.map(|subcategory| subcategory.category_id),
        &mut errors,
    );

    if let Some(category_id) = input.category_id
        && !Category::exists(category_id, Scope::Active, connection)?
    {
        errors.add("category", &invalid_reference_message(category_id));
    }

    errors.into_result()?;

    let description = input
        .description
        .or_else(|| current.map(|subcategory| subcategory.description.clone()))
        .unwrap_or_default();

    Ok((
        name.unwrap_or_default(),
        category_id.unwrap_or_default(),
        description,
    ))
}

/// Insert a subcategory and return it.
///
/// # Errors
/// Returns a validation error if the category already has a subcategory with
/// this name, or [Error::ProtectedReference] if `category_id` does not exist.
pub fn insert_subcategory(
    name: &str,
    category_id: DatabaseId,
    description: &str,
    connection: &Connection,
) -> Result<SubcategoryRecord, Error> {
    connection
        .execute(
            "INSERT INTO subcategory (category_id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4)",
            (category_id, name, description, Timestamp::now()),
        )
        .map_err(map_duplicate)?;

    let id = connection.last_insert_rowid();
    tracing::debug!("Inserted subcategory {id}");

    get_subcategory_in_scope(id, Scope::All, connection)
}

/// Get the active subcategory `id`.
pub fn get_subcategory(
    id: DatabaseId,
    connection: &Connection,
) -> Result<SubcategoryRecord, Error> {
    get_subcategory_in_scope(id, Scope::Active, connection)
}

fn get_subcategory_in_scope(
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<SubcategoryRecord, Error> {
    let mut filter = Filter::scoped(scope, "s");
    filter.equals("s.id", Some(id));

    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM {FROM} {}", filter.where_clause()),
            rusqlite::params_from_iter(filter.params()),
            map_row,
        )
        .map_err(Error::from)
}

/// Get the category of subcategory `id`, or `None` if there is no such subcategory in `scope`.
pub fn get_subcategory_link(
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<Option<SubcategoryLink>, Error> {
    match get_subcategory_in_scope(id, scope, connection) {
        Ok(subcategory) => Ok(Some(SubcategoryLink::from(&subcategory))),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Find a subcategory by its natural key, in any scope.
pub fn find_subcategory(
    name: &str,
    category_id: DatabaseId,
    connection: &Connection,
) -> Result<Option<SubcategoryRecord>, Error> {
    match connection.query_row(
        &format!("SELECT {COLUMNS} FROM {FROM} WHERE s.name = ?1 AND s.category_id = ?2"),
        (name, category_id),
        map_row,
    ) {
        Ok(subcategory) => Ok(Some(subcategory)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// All active subcategories of the category `category_id`, in default order.
pub fn list_subcategories_by_category(
    category_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<SubcategoryRecord>, Error> {
    let mut filter = Filter::scoped(Scope::Active, "s");
    filter.equals("s.category_id", Some(category_id));

    Listing {
        columns: COLUMNS,
        from: FROM,
        filter,
        order_by: format!("ORDER BY {DEFAULT_ORDERING}, {TIE_BREAKER}"),
    }
    .fetch_all(connection, map_row)
}

/// Initialize the subcategory table and indexes.
pub fn create_subcategory_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS subcategory (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            {SOFT_DELETE_COLUMNS},
            UNIQUE(category_id, name),
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_subcategory_category ON subcategory(category_id);"
    ))
}

fn map_duplicate(error: rusqlite::Error) -> Error {
    if is_unique_violation(&error) {
        Error::Validation(FieldErrors::single(NON_FIELD_ERRORS, DUPLICATE_MESSAGE))
    } else {
        error.into()
    }
}

fn map_row(row: &Row) -> Result<SubcategoryRecord, rusqlite::Error> {
    Ok(SubcategoryRecord {
        id: row.get(0)?,
        category_id: row.get(1)?,
        category_name: row.get(2)?,
        type_name: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        is_deleted: row.get(7)?,
        deleted_at: row.get(8)?,
    })
}

#[cfg(test)]
mod subcategory_tests {
    use crate::{
        Error,
        category::Category,
        pagination::PageRequest,
        resource::Resource,
        soft_delete::{Scope, SoftDelete},
        subcategory::{SubcategoryFilter, SubcategoryInput},
        test_utils::{
            create_test_category, create_test_subcategory, create_test_type, get_test_connection,
        },
        transaction_type::OUTFLOW_TYPE_NAME,
        validation::{NON_FIELD_ERRORS, WriteMode},
    };

    use super::{Subcategory, get_subcategory, list_subcategories_by_category};

    const FIRST_PAGE: PageRequest = PageRequest {
        page: 1,
        page_size: 20,
    };

    #[test]
    fn create_subcategory_includes_parent_names() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Инфраструктура", outflow.id, &connection);

        let subcategory = Subcategory::create(
            SubcategoryInput {
                name: Some("VPS".to_owned()),
                category_id: Some(category.id),
                description: None,
            },
            &connection,
        )
        .expect("Could not create subcategory");

        assert_eq!(subcategory.category_id, category.id);
        assert_eq!(subcategory.category_name, "Инфраструктура");
        assert_eq!(subcategory.type_name, OUTFLOW_TYPE_NAME);
        assert_eq!(get_subcategory(subcategory.id, &connection), Ok(subcategory));
    }

    #[test]
    fn create_subcategory_requires_active_category() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Инфраструктура", outflow.id, &connection);
        Category::soft_delete(category.id, &connection).unwrap();

        let result = Subcategory::create(
            SubcategoryInput {
                name: Some("VPS".to_owned()),
                category_id: Some(category.id),
                description: None,
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.contains("category")));
    }

    #[test]
    fn duplicate_name_within_category_is_rejected() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Инфраструктура", outflow.id, &connection);
        create_test_subcategory("VPS", category.id, &connection);

        let result = Subcategory::create(
            SubcategoryInput {
                name: Some("VPS".to_owned()),
                category_id: Some(category.id),
                description: None,
            },
            &connection,
        );

        assert!(
            matches!(result, Err(Error::Validation(errors)) if errors.contains(NON_FIELD_ERRORS))
        );
    }

    #[test]
    fn list_filters_by_category_and_search() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let infrastructure = create_test_category("Инфраструктура", outflow.id, &connection);
        let marketing = create_test_category("Маркетинг", outflow.id, &connection);
        create_test_subcategory("VPS", infrastructure.id, &connection);
        create_test_subcategory("Хостинг", infrastructure.id, &connection);
        create_test_subcategory("SMM", marketing.id, &connection);

        let filter = SubcategoryFilter {
            category_id: Some(infrastructure.id.to_string()),
            search: Some("хост".to_owned()),
            ordering: None,
        };

        let page = Subcategory::list(&filter, Scope::Active, FIRST_PAGE, &connection).unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].name, "Хостинг");
    }

    #[test]
    fn partial_update_renames_subcategory() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Маркетинг", outflow.id, &connection);
        let subcategory = create_test_subcategory("Avito", category.id, &connection);

        let updated = Subcategory::update(
            subcategory.id,
            SubcategoryInput {
                name: Some("Авито".to_owned()),
                ..Default::default()
            },
            WriteMode::Partial,
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Авито");
        assert_eq!(updated.category_id, category.id);
    }

    #[test]
    fn by_category_excludes_soft_deleted() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Зарплаты", outflow.id, &connection);
        let staff = create_test_subcategory("Штатные сотрудники", category.id, &connection);
        let freelancers = create_test_subcategory("Фрилансеры", category.id, &connection);
        Subcategory::soft_delete(freelancers.id, &connection).unwrap();

        let got = list_subcategories_by_category(category.id, &connection).unwrap();

        assert_eq!(got, [staff]);
    }
}
