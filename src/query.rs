//! Building the WHERE and ORDER BY clauses of listing queries from query parameters.
//!
//! Each collection declares which columns it searches and which fields it can
//! be ordered by, then feeds the raw query parameters through these helpers.

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    DatabaseId, Error, FieldErrors,
    db::CASEFOLD_FUNCTION,
    pagination::{Page, PageRequest},
    soft_delete::Scope,
    timestamp::{format_date, parse_date},
};

/// The WHERE clause of a query and the values bound to its placeholders.
///
/// Placeholders are anonymous (`?`), so conditions must be pushed in the
/// order their values should be bound.
#[derive(Debug, Default)]
pub struct Filter {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    /// Start with the soft-delete predicate for `scope` on the table aliased as `alias`.
    pub fn scoped(scope: Scope, alias: &str) -> Self {
        let mut filter = Self::default();

        if let Some(predicate) = scope.predicate(alias) {
            filter.conditions.push(predicate);
        }

        filter
    }

    /// Add a condition with the values for its placeholders.
    pub fn push(&mut self, condition: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.conditions.push(condition.into());
        self.params.extend(params);
    }

    /// Add `column = id` if an ID was given.
    pub fn equals(&mut self, column: &str, id: Option<DatabaseId>) {
        if let Some(id) = id {
            self.push(format!("{column} = ?"), [Value::Integer(id)]);
        }
    }

    /// Require every search term to appear in at least one of `columns`.
    ///
    /// Matching ignores case, including for non-ASCII letters.
    pub fn search(&mut self, raw: Option<&str>, columns: &[&str]) {
        for term in parse_search_terms(raw) {
            let condition = columns
                .iter()
                .map(|column| format!("instr({CASEFOLD_FUNCTION}({column}), ?) > 0"))
                .collect::<Vec<_>>()
                .join(" OR ");

            self.push(
                format!("({condition})"),
                columns.iter().map(|_| Value::Text(term.clone())),
            );
        }
    }

    /// The `WHERE ...` clause, or an empty string if there are no conditions.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// The values to bind, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Split a `?search=` value into lowercase terms.
///
/// Terms are separated by whitespace and commas.
pub fn parse_search_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Build the `ORDER BY` clause for an `?ordering=` value.
///
/// `allowed` maps the public field names to SQL columns. Unknown fields are
/// ignored and `default` is used when no known fields remain. `tie_breaker`
/// is always appended so that pages are stable.
pub fn order_by(
    raw: Option<&str>,
    allowed: &[(&str, &str)],
    default: &str,
    tie_breaker: &str,
) -> String {
    let terms: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|field| {
            let (name, direction) = match field.strip_prefix('-') {
                Some(name) => (name, "DESC"),
                None => (field, "ASC"),
            };

            allowed
                .iter()
                .find(|(public_name, _)| *public_name == name)
                .map(|(_, column)| format!("{column} {direction}"))
        })
        .collect();

    let ordering = if terms.is_empty() {
        default.to_owned()
    } else {
        terms.join(", ")
    };

    format!("ORDER BY {ordering}, {tie_breaker}")
}

/// Parse an optional ID filter such as `?type=3`.
///
/// Empty values are treated as absent, like an unselected dropdown.
///
/// # Errors
/// Returns a field-scoped [Error::Validation] if the value is not an integer.
pub fn parse_id_filter(field: &str, raw: Option<&str>) -> Result<Option<DatabaseId>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            Error::Validation(FieldErrors::single(
                field,
                "Select a valid choice. That choice is not one of the available choices.",
            ))
        }),
    }
}

/// Parse an optional `YYYY-MM-DD` filter and return it in storage format.
///
/// # Errors
/// Returns a field-scoped [Error::Validation] if the value is not a valid date.
pub fn parse_date_filter(field: &str, raw: Option<&str>) -> Result<Option<String>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw).map(|date| Some(format_date(date))).map_err(|_| {
            Error::Validation(FieldErrors::single(
                field,
                "Enter a valid date in the format YYYY-MM-DD.",
            ))
        }),
    }
}

/// Parse a required ID parameter for a custom action, e.g. `?type_id=3`.
///
/// # Errors
/// Returns [Error::MissingParameter] if the parameter is absent or empty and
/// [Error::InvalidParameter] if it is not an integer.
pub fn require_id_param(name: &'static str, raw: Option<&str>) -> Result<DatabaseId, Error> {
    match raw.map(str::trim) {
        None | Some("") => Err(Error::MissingParameter(name)),
        Some(raw) => raw.parse().map_err(|_| Error::InvalidParameter {
            name,
            value: raw.to_owned(),
        }),
    }
}

/// The pieces of a paginated listing query.
pub struct Listing<'a> {
    /// The column list of the SELECT.
    pub columns: &'a str,
    /// The FROM clause including any joins.
    pub from: &'a str,
    pub filter: Filter,
    /// The full ORDER BY clause.
    pub order_by: String,
}

impl Listing<'_> {
    /// Count the matching rows and fetch the requested page.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] if the page lies past the end of the
    /// listing, or [Error::SqlError] if a query fails.
    pub fn fetch_page<T>(
        &self,
        request: PageRequest,
        connection: &Connection,
        map_row: impl FnMut(&Row) -> Result<T, rusqlite::Error>,
    ) -> Result<Page<T>, Error> {
        let where_clause = self.filter.where_clause();

        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(*) FROM {} {where_clause}", self.from),
            params_from_iter(self.filter.params()),
            |row| row.get(0),
        )?;
        let count = count_to_u64(count)?;

        let mut params = self.filter.params().to_vec();
        params.push(Value::Integer(request.page_size as i64));
        params.push(Value::Integer(request.offset() as i64));

        let results = connection
            .prepare(&format!(
                "SELECT {} FROM {} {where_clause} {} LIMIT ? OFFSET ?",
                self.columns, self.from, self.order_by
            ))?
            .query_map(params_from_iter(params), map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Page::new(results, count, request)
    }

    /// Fetch every matching row without pagination.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if the query fails.
    pub fn fetch_all<T>(
        &self,
        connection: &Connection,
        map_row: impl FnMut(&Row) -> Result<T, rusqlite::Error>,
    ) -> Result<Vec<T>, Error> {
        connection
            .prepare(&format!(
                "SELECT {} FROM {} {} {}",
                self.columns,
                self.from,
                self.filter.where_clause(),
                self.order_by
            ))?
            .query_map(params_from_iter(self.filter.params()), map_row)?
            .map(|row| row.map_err(Error::from))
            .collect()
    }
}

/// Convert the result of an SQL `COUNT` to an unsigned count.
///
/// # Errors
/// Returns [Error::SqlError] if `count` is negative.
pub(crate) fn count_to_u64(count: i64) -> Result<u64, Error> {
    u64::try_from(count)
        .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value;

    use crate::{Error, soft_delete::Scope};

    use super::{
        Filter, count_to_u64, order_by, parse_date_filter, parse_id_filter, parse_search_terms,
        require_id_param,
    };

    const ORDERING: [(&str, &str); 2] = [("name", "s.name"), ("created_at", "s.created_at")];

    #[test]
    fn search_terms_split_on_whitespace_and_commas() {
        let terms = parse_search_terms(Some(" VPS,  Хостинг  domains "));

        assert_eq!(terms, ["vps", "хостинг", "domains"]);
    }

    #[test]
    fn empty_search_has_no_terms() {
        assert!(parse_search_terms(None).is_empty());
        assert!(parse_search_terms(Some(" , ")).is_empty());
    }

    #[test]
    fn order_by_maps_fields_to_columns() {
        let clause = order_by(Some("-created_at,name"), &ORDERING, "s.name ASC", "s.id ASC");

        assert_eq!(
            clause,
            "ORDER BY s.created_at DESC, s.name ASC, s.id ASC"
        );
    }

    #[test]
    fn order_by_ignores_unknown_fields() {
        let clause = order_by(Some("password,-id"), &ORDERING, "s.name ASC", "s.id ASC");

        assert_eq!(clause, "ORDER BY s.name ASC, s.id ASC");
    }

    #[test]
    fn filter_combines_conditions() {
        let mut filter = Filter::scoped(Scope::Active, "s");
        filter.equals("s.type_id", Some(4));
        filter.equals("s.category_id", None);
        filter.search(Some("vps"), &["s.name", "s.description"]);

        assert_eq!(
            filter.where_clause(),
            "WHERE s.is_deleted = 0 AND s.type_id = ? AND \
            (instr(casefold(s.name), ?) > 0 OR instr(casefold(s.description), ?) > 0)"
        );
        assert_eq!(
            filter.params(),
            [
                Value::Integer(4),
                Value::Text("vps".to_owned()),
                Value::Text("vps".to_owned())
            ]
        );
    }

    #[test]
    fn unrestricted_scope_has_no_where_clause() {
        assert_eq!(Filter::scoped(Scope::All, "s").where_clause(), "");
    }

    #[test]
    fn id_filter_ignores_empty_values() {
        assert_eq!(parse_id_filter("type", Some("")), Ok(None));
        assert_eq!(parse_id_filter("type", Some("12")), Ok(Some(12)));
        assert!(matches!(
            parse_id_filter("type", Some("abc")),
            Err(Error::Validation(errors)) if errors.contains("type")
        ));
    }

    #[test]
    fn date_filter_requires_iso_dates() {
        assert_eq!(
            parse_date_filter("start_date", Some("2025-01-31")),
            Ok(Some("2025-01-31".to_owned()))
        );
        assert!(matches!(
            parse_date_filter("start_date", Some("31.01.2025")),
            Err(Error::Validation(errors)) if errors.contains("start_date")
        ));
    }

    #[test]
    fn required_id_param() {
        assert_eq!(
            require_id_param("type_id", None),
            Err(Error::MissingParameter("type_id"))
        );
        assert_eq!(
            require_id_param("type_id", Some("")),
            Err(Error::MissingParameter("type_id"))
        );
        assert_eq!(require_id_param("type_id", Some("7")), Ok(7));
        assert_eq!(
            require_id_param("type_id", Some("seven")),
            Err(Error::InvalidParameter {
                name: "type_id",
                value: "seven".to_owned()
            })
        );
    }

    #[test]
    fn counts_convert_to_unsigned() {
        assert_eq!(count_to_u64(0), Ok(0));
        assert_eq!(count_to_u64(42), Ok(42));
        assert!(matches!(count_to_u64(-1), Err(Error::SqlError(_))));
    }
}
