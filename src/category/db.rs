//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    DatabaseId, Error, FieldErrors,
    category::{CategoryFilter, CategoryInput, CategoryLink, CategoryRecord},
    db::is_unique_violation,
    pagination::{Page, PageRequest},
    query::{Filter, Listing, order_by, parse_id_filter},
    resource::Resource,
    soft_delete::{SOFT_DELETE_COLUMNS, Scope, SoftDelete},
    timestamp::Timestamp,
    transaction_type::TransactionType,
    validation::{
        NON_FIELD_ERRORS, WriteMode, invalid_reference_message, require_reference, validate_name,
    },
};

/// The category collection.
pub struct Category;

impl SoftDelete for Category {
    const TABLE: &'static str = "category";
    const LABEL: &'static str = "category";
}

const COLUMNS: &str = "c.id, c.name, c.type_id, t.name, c.description, c.created_at, \
    c.is_deleted, c.deleted_at";

const FROM: &str = "category c INNER JOIN operation_type t ON t.id = c.type_id";

const ORDERING_FIELDS: [(&str, &str); 2] = [("name", "c.name"), ("created_at", "c.created_at")];

const DEFAULT_ORDERING: &str = "c.name ASC";

const TIE_BREAKER: &str = "c.id ASC";

const DUPLICATE_MESSAGE: &str = "The fields name, type must make a unique set.";

impl Resource for Category {
    type Record = CategoryRecord;
    type Input = CategoryInput;
    type Filter = CategoryFilter;

    fn list(
        params: &CategoryFilter,
        scope: Scope,
        request: PageRequest,
        connection: &Connection,
    ) -> Result<Page<CategoryRecord>, Error> {
        let mut filter = Filter::scoped(scope, "c");
        filter.equals("c.type_id", parse_id_filter("type", params.type_id.as_deref())?);
        filter.search(params.search.as_deref(), &["c.name", "c.description"]);

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

    fn retrieve(id: DatabaseId, connection: &Connection) -> Result<CategoryRecord, Error> {
        get_category(id, connection)
    }

    fn create(input: CategoryInput, connection: &Connection) -> Result<CategoryRecord, Error> {
        let (name, type_id, description) = validate_input(input, None, connection)?;

        insert_category(&name, type_id, &description, connection)
    }

    fn update(
        id: DatabaseId,
        input: CategoryInput,
        mode: WriteMode,
        connection: &Connection,
    ) -> Result<CategoryRecord, Error> {
        let current = get_category(id, connection)?;
        let current = match mode {
            WriteMode::Full => None,
            WriteMode::Partial => Some(&current),
        };

        let (name, type_id, description) = validate_input(input, current, connection)?;

        let rows_affected = connection
            .execute(
                "UPDATE category SET name = ?1, type_id = ?2, description = ?3
                WHERE id = ?4 AND is_deleted = 0",
                (name, type_id, description, id),
            )
            .map_err(map_duplicate)?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        tracing::debug!("Updated category {id}");

        get_category(id, connection)
    }
}

fn validate_input(
    input: CategoryInput,
    current: Option<&CategoryRecord>,
    connection: &Connection,
) -> Result<(String, DatabaseId, String), Error> {
    let mut errors = FieldErrors::new();

    let name = validate_name(
        input.name.as_deref(),
        current.map(|category| category.name.as_str()),
        &mut errors,
    );
    let type_id = require_reference(
        "type",
        input.type_id,
        current.map(|category| category.type_id),
        &mut errors,
    );

    // A type kept from the stored row stays valid even if it was soft-deleted since.
    if let Some(type_id) = input.type_id
        && !TransactionType::exists(type_id, Scope::Active, connection)?
    {
        errors.add("type", &invalid_reference_message(type_id));
    }

    errors.into_result()?;

    let description = input
        .description
        .or_else(|| current.map(|category| category.description.clone()))
        .unwrap_or_default();

    Ok((
        name.unwrap_or_default(),
        type_id.unwrap_or_default(),
        description,
    ))
}

/// Insert a category and return it.
///
/// # Errors
/// Returns a validation error if the type already has a category with this
/// name, or [Error::ProtectedReference] if `type_id` does not exist.
pub fn insert_category(
    name: &str,
    type_id: DatabaseId,
    description: &str,
    connection: &Connection,
) -> Result<CategoryRecord, Error> {
    connection
        .execute(
            "INSERT INTO category (name, type_id, description, created_at)
            VALUES (?1, ?2, ?3, ?4)",
            (name, type_id, description, Timestamp::now()),
        )
        .map_err(map_duplicate)?;

    let id = connection.last_insert_rowid();
    tracing::debug!("Inserted category {id}");

    get_category_in_scope(id, Scope::All, connection)
}

/// Get the active category `id`.
pub fn get_category(id: DatabaseId, connection: &Connection) -> Result<CategoryRecord, Error> {
    get_category_in_scope(id, Scope::Active, connection)
}

fn get_category_in_scope(
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<CategoryRecord, Error> {
    let mut filter = Filter::scoped(scope, "c");
    filter.equals("c.id", Some(id));

    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM {FROM} {}", filter.where_clause()),
            rusqlite::params_from_iter(filter.params()),
            map_row,
        )
        .map_err(Error::from)
}

/// Get the type of category `id`, or `None` if there is no such category in `scope`.
pub fn get_category_link(
    id: DatabaseId,
    scope: Scope,
    connection: &Connection,
) -> Result<Option<CategoryLink>, Error> {
    match get_category_in_scope(id, scope, connection) {
        Ok(category) => Ok(Some(CategoryLink::from(&category))),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Find a category by its natural key, in any scope.
pub fn find_category(
    name: &str,
    type_id: DatabaseId,
    connection: &Connection,
) -> Result<Option<CategoryRecord>, Error> {
    match connection.query_row(
        &format!("SELECT {COLUMNS} FROM {FROM} WHERE c.name = ?1 AND c.type_id = ?2"),
        (name, type_id),
        map_row,
    ) {
        Ok(category) => Ok(Some(category)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// All active categories of the operation type `type_id`, in default order.
pub fn list_categories_by_type(
    type_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<CategoryRecord>, Error> {
    let mut filter = Filter::scoped(Scope::Active, "c");
    filter.equals("c.type_id", Some(type_id));

    Listing {
        columns: COLUMNS,
        from: FROM,
        filter,
        order_by: format!("ORDER BY {DEFAULT_ORDERING}, {TIE_BREAKER}"),
    }
    .fetch_all(connection, map_row)
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type_id INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            {SOFT_DELETE_COLUMNS},
            UNIQUE(name, type_id),
            FOREIGN KEY(type_id) REFERENCES operation_type(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_type ON category(type_id);"
    ))
}

fn map_duplicate(error: rusqlite::Error) -> Error {
    if is_unique_violation(&error) {
        Error::Validation(FieldErrors::single(NON_FIELD_ERRORS, DUPLICATE_MESSAGE))
    } else {
        error.into()
    }
}

fn map_row(row: &Row) -> Result<CategoryRecord, rusqlite::Error> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        type_id: row.get(2)?,
        type_name: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        is_deleted: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{
        Error, FieldErrors,
        category::{CategoryFilter, CategoryInput, CategoryLink},
        pagination::PageRequest,
        resource::Resource,
        soft_delete::{Scope, SoftDelete},
        test_utils::{create_test_category, create_test_type, get_test_connection},
        transaction_type::{INFLOW_TYPE_NAME, OUTFLOW_TYPE_NAME, TransactionType},
        validation::{NON_FIELD_ERRORS, WriteMode, invalid_reference_message},
    };

    use super::{Category, get_category, get_category_link, list_categories_by_type};

    const FIRST_PAGE: PageRequest = PageRequest {
        page: 1,
        page_size: 20,
    };

    fn input(name: &str, type_id: i64) -> CategoryInput {
        CategoryInput {
            name: Some(name.to_owned()),
            type_id: Some(type_id),
            description: None,
        }
    }

    fn listed_names(filter: &CategoryFilter, connection: &Connection) -> Vec<String> {
        Category::list(filter, Scope::Active, FIRST_PAGE, connection)
            .unwrap()
            .results
            .into_iter()
            .map(|category| category.name)
            .collect()
    }

    #[test]
    fn create_category_includes_type_name() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);

        let category = Category::create(input("Маркетинг", outflow.id), &connection)
            .expect("Could not create category");

        assert_eq!(category.type_id, outflow.id);
        assert_eq!(category.type_name, OUTFLOW_TYPE_NAME);
        assert_eq!(get_category(category.id, &connection), Ok(category));
    }

    #[test]
    fn create_category_with_unknown_type_fails() {
        let connection = get_test_connection();

        let result = Category::create(input("Маркетинг", 99), &connection);

        assert_eq!(
            result,
            Err(Error::Validation(FieldErrors::single(
                "type",
                &invalid_reference_message(99)
            )))
        );
    }

    #[test]
    fn create_category_with_soft_deleted_type_fails() {
        let connection = get_test_connection();
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        TransactionType::soft_delete(outflow.id, &connection).unwrap();

        let result = Category::create(input("Маркетинг", outflow.id), &connection);

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.contains("type")));
    }

    #[test]
    fn same_name_is_allowed_under_different_types() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);

        Category::create(input("Прочее", inflow.id), &connection).unwrap();
        let result = Category::create(input("Прочее", outflow.id), &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn same_name_under_one_type_is_rejected() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        Category::create(input("Прочее", inflow.id), &connection).unwrap();

        let result = Category::create(input("Прочее", inflow.id), &connection);

        assert!(
            matches!(result, Err(Error::Validation(errors)) if errors.contains(NON_FIELD_ERRORS))
        );
    }

    #[test]
    fn list_filters_by_type() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        create_test_category("Доходы", inflow.id, &connection);
        create_test_category("Зарплаты", outflow.id, &connection);
        create_test_category("Инвестиции", inflow.id, &connection);

        let filter = CategoryFilter {
            type_id: Some(inflow.id.to_string()),
            ..Default::default()
        };

        assert_eq!(listed_names(&filter, &connection), ["Доходы", "Инвестиции"]);
        assert_eq!(listed_names(&CategoryFilter::default(), &connection).len(), 3);
    }

    #[test]
    fn list_with_non_numeric_type_fails() {
        let connection = get_test_connection();
        let filter = CategoryFilter {
            type_id: Some("income".to_owned()),
            ..Default::default()
        };

        let result = Category::list(&filter, Scope::Active, FIRST_PAGE, &connection);

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.contains("type")));
    }

    #[test]
    fn partial_update_can_move_category_to_another_type() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Прочее", inflow.id, &connection);

        let updated = Category::update(
            category.id,
            CategoryInput {
                type_id: Some(outflow.id),
                ..Default::default()
            },
            WriteMode::Partial,
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Прочее");
        assert_eq!(updated.type_id, outflow.id);
        assert_eq!(updated.type_name, OUTFLOW_TYPE_NAME);
    }

    #[test]
    fn full_update_requires_type() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Прочее", inflow.id, &connection);

        let result = Category::update(
            category.id,
            CategoryInput {
                name: Some("Другое".to_owned()),
                ..Default::default()
            },
            WriteMode::Full,
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.contains("type")));
    }

    #[test]
    fn by_type_excludes_soft_deleted_categories() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let outflow = create_test_type(OUTFLOW_TYPE_NAME, &connection);
        let income = create_test_category("Доходы", inflow.id, &connection);
        let investments = create_test_category("Инвестиции", inflow.id, &connection);
        create_test_category("Зарплаты", outflow.id, &connection);
        Category::soft_delete(investments.id, &connection).unwrap();

        let got = list_categories_by_type(inflow.id, &connection).unwrap();

        assert_eq!(got, [income]);
    }

    #[test]
    fn soft_deleting_type_leaves_categories_untouched() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Доходы", inflow.id, &connection);

        TransactionType::soft_delete(inflow.id, &connection).unwrap();

        assert_eq!(get_category(category.id, &connection), Ok(category));
    }

    #[test]
    fn link_is_none_for_soft_deleted_category() {
        let connection = get_test_connection();
        let inflow = create_test_type(INFLOW_TYPE_NAME, &connection);
        let category = create_test_category("Доходы", inflow.id, &connection);

        assert_eq!(
            get_category_link(category.id, Scope::Active, &connection),
            Ok(Some(CategoryLink {
                id: category.id,
                type_id: inflow.id
            }))
        );

        Category::soft_delete(category.id, &connection).unwrap();

        assert_eq!(get_category_link(category.id, Scope::Active, &connection), Ok(None));
        assert_eq!(
            get_category_link(category.id, Scope::All, &connection),
            Ok(Some(CategoryLink {
                id: category.id,
                type_id: inflow.id
            }))
        );
    }
}
