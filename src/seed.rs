//! Loads the initial reference data: statuses, operation types, and the
//! category and subcategory taxonomy under each type.

use std::fmt::Display;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    DatabaseId, Error,
    category::{find_category, insert_category},
    named::{find_named_by_name, insert_named},
    soft_delete::SoftDelete,
    status::Status,
    subcategory::{find_subcategory, insert_subcategory},
    transaction_type::{INFLOW_TYPE_NAME, OUTFLOW_TYPE_NAME, TransactionType},
};

struct SeedCategory {
    name: &'static str,
    description: &'static str,
    subcategories: &'static [&'static str],
}

struct SeedType {
    name: &'static str,
    description: &'static str,
    categories: &'static [SeedCategory],
}

const STATUSES: [(&str, &str); 3] = [
    ("Бизнес", "Бизнес операции"),
    ("Личное", "Личные финансы"),
    ("Налог", "Налоговые операции"),
];

const TYPES: [SeedType; 2] = [
    SeedType {
        name: INFLOW_TYPE_NAME,
        description: "Поступление денежных средств",
        categories: &[
            SeedCategory {
                name: "Доходы",
                description: "Источники доходов",
                subcategories: &["Продажи", "Услуги", "Прочее"],
            },
            SeedCategory {
                name: "Инвестиции",
                description: "Инвестиционные поступления",
                subcategories: &["Дивиденды", "Проценты", "Рост капитала"],
            },
        ],
    },
    SeedType {
        name: OUTFLOW_TYPE_NAME,
        description: "Расход денежных средств",
        categories: &[
            SeedCategory {
                name: "Инфраструктура",
                description: "Расходы на инфраструктуру",
                subcategories: &["VPS", "Proxy", "Хостинг", "Домены"],
            },
            SeedCategory {
                name: "Маркетинг",
                description: "Маркетинговые расходы",
                subcategories: &["Farpost", "Avito", "Контекстная реклама", "SMM"],
            },
            SeedCategory {
                name: "Зарплаты",
                description: "Выплаты сотрудникам",
                subcategories: &["Штатные сотрудники", "Фрилансеры"],
            },
        ],
    },
];

/// How many rows of each kind a run of [load_initial_data] created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// The number of statuses created.
    pub statuses: usize,
    /// The number of operation types created.
    pub types: usize,
    /// The number of categories created.
    pub categories: usize,
    /// The number of subcategories created.
    pub subcategories: usize,
}

impl Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created {} statuses, {} types, {} categories and {} subcategories",
            self.statuses, self.types, self.categories, self.subcategories
        )
    }
}

/// Create the statuses, operation types, categories and subcategories that
/// are missing from the database.
///
/// Rows are matched by their natural key (name, plus the parent for
/// categories and subcategories) whether or not they are soft-deleted, so
/// running this again creates nothing. Everything happens in one
/// transaction.
///
/// # Errors
/// Returns an error if a query fails, in which case nothing is written.
pub fn load_initial_data(connection: &Connection) -> Result<SeedReport, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let mut report = SeedReport::default();

    for (name, description) in STATUSES {
        get_or_create_named::<Status>(name, description, &transaction, &mut report.statuses)?;
    }

    for seed_type in &TYPES {
        let type_id = get_or_create_named::<TransactionType>(
            seed_type.name,
            seed_type.description,
            &transaction,
            &mut report.types,
        )?;

        for seed_category in seed_type.categories {
            let category_id = match find_category(seed_category.name, type_id, &transaction)? {
                Some(category) => category.id,
                None => {
                    report.categories += 1;
                    insert_category(
                        seed_category.name,
                        type_id,
                        seed_category.description,
                        &transaction,
                    )?
                    .id
                }
            };

            for &name in seed_category.subcategories {
                if find_subcategory(name, category_id, &transaction)?.is_none() {
                    insert_subcategory(name, category_id, "", &transaction)?;
                    report.subcategories += 1;
                }
            }
        }
    }

    transaction.commit()?;

    tracing::info!("Loaded initial data: {report}");

    Ok(report)
}

fn get_or_create_named<T: SoftDelete>(
    name: &str,
    description: &str,
    connection: &Connection,
    created: &mut usize,
) -> Result<DatabaseId, Error> {
    if let Some(record) = find_named_by_name(T::TABLE, name, connection)? {
        return Ok(record.id);
    }

    *created += 1;

    insert_named(T::TABLE, T::LABEL, name, description, connection).map(|record| record.id)
}
