//! Income and expense totals over a filtered set of notes.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::{Connection, params_from_iter, types::Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    DbState, Error,
    note::{
        NoteFilter,
        amount::from_minor_units,
        db::{FROM, note_filter},
    },
    query::count_to_u64,
    soft_delete::Scope,
    transaction_type::{INFLOW_TYPE_NAME, OUTFLOW_TYPE_NAME},
};

/// The totals of the active notes matching a filter.
///
/// Amounts are serialized as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The sum of the amounts of inflow notes.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    /// The sum of the amounts of outflow notes.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    /// The number of matching notes, of any type.
    pub total_transactions: u64,
    /// Income minus expense.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Sum the active notes that match `params`.
///
/// A note counts as income or expense by the name of its type. Notes of any
/// other type only add to `total_transactions`.
///
/// # Errors
/// Returns a field-scoped [Error::Validation] if a filter cannot be parsed, or
/// [Error::SqlError] if the query fails.
pub fn summarize_notes(params: &NoteFilter, connection: &Connection) -> Result<Summary, Error> {
    let filter = note_filter(params, Scope::Active)?;

    let mut query_params = vec![
        Value::Text(INFLOW_TYPE_NAME.to_owned()),
        Value::Text(OUTFLOW_TYPE_NAME.to_owned()),
    ];
    query_params.extend_from_slice(filter.params());

    let (income, expense, count): (i64, i64, i64) = connection.query_row(
        &format!(
            "SELECT
                COALESCE(SUM(CASE WHEN t.name = ? THEN n.amount END), 0),
                COALESCE(SUM(CASE WHEN t.name = ? THEN n.amount END), 0),
                COUNT(n.id)
            FROM {FROM} {}",
            filter.where_clause()
        ),
        params_from_iter(query_params),
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let total_income = from_minor_units(income);
    let total_expense = from_minor_units(expense);

    Ok(Summary {
        total_income,
        total_expense,
        total_transactions: count_to_u64(count)?,
        balance: total_income - total_expense,
    })
}

/// A route handler for the income and expense totals of the filtered notes.
///
/// Accepts the same filter, date range and search parameters as the note listing.
pub async fn get_summary_endpoint(
    State(state): State<DbState>,
    Query(params): Query<NoteFilter>,
) -> Result<Json<Summary>, Error> {
    let connection = state.lock()?;

    summarize_notes(&params, &connection).map(Json)
}

#[cfg(test)]
mod summary_tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::{
        note::{Note, NoteFilter},
        soft_delete::SoftDelete,
        test_utils::{create_test_note, create_test_taxonomy, get_test_connection},
    };

    use super::{Summary, summarize_notes};

    fn decimal(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let connection = get_test_connection();

        let summary = summarize_notes(&NoteFilter::default(), &connection).unwrap();

        assert_eq!(
            summary,
            Summary {
                total_income: Decimal::ZERO,
                total_expense: Decimal::ZERO,
                total_transactions: 0,
                balance: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let connection = get_test_connection();
        let taxonomy = create_test_taxonomy(&connection);
        create_test_note(&taxonomy, true, "100", "2025-01-01", &connection);
        create_test_note(&taxonomy, false, "40", "2025-01-02", &connection);

        let summary = summarize_notes(&NoteFilter::default(), &connection).unwrap();

        assert_eq!(summary.total_income, decimal("100"));
        assert_eq!(summary.total_expense, decimal("40"));
        assert_eq!(summary.total_transactions, 2);
        assert_eq!(summary.balance, decimal("60"));
    }

    #[test]
    fn sums_are_exact() {
        let connection = get_test_connection();
        let taxonomy = create_test_taxonomy(&connection);
        for _ in 0..10 {
            create_test_note(&taxonomy, true, "0.1", "2025-01-01", &connection);
        }
        create_test_note(&taxonomy, false, "0.3", "2025-01-01", &connection);

        let summary = summarize_notes(&NoteFilter::default(), &connection).unwrap();

        assert_eq!(summary.total_income, decimal("1.00"));
        assert_eq!(summary.balance, decimal("0.70"));
    }

    #[test]
    fn summary_applies_filters_and_skips_deleted_notes() {
        let connection = get_test_connection();
        let taxonomy = create_test_taxonomy(&connection);
        create_test_note(&taxonomy, true, "100", "2025-01-15", &connection);
        create_test_note(&taxonomy, true, "500", "2025-02-15", &connection);
        let deleted = create_test_note(&taxonomy, false, "40", "2025-01-20", &connection);
        Note::soft_delete(deleted.id, &connection).unwrap();

        let january = NoteFilter {
            start_date: Some("2025-01-01".to_owned()),
            end_date: Some("2025-01-31".to_owned()),
            ..Default::default()
        };

        let summary = summarize_notes(&january, &connection).unwrap();

        assert_eq!(summary.total_income, decimal("100"));
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.total_transactions, 1);
    }

    #[test]
    fn serializes_amounts_as_numbers() {
        let summary = Summary {
            total_income: decimal("100.00"),
            total_expense: decimal("40.50"),
            total_transactions: 2,
            balance: decimal("59.50"),
        };

        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({
                "total_income": 100.0,
                "total_expense": 40.5,
                "total_transactions": 2,
                "balance": 59.5,
            })
        );
    }
}
