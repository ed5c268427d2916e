//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/notes/{id}/', use [format_endpoint].

/// The route for listing and creating statuses.
pub const STATUSES: &str = "/api/statuses/";
/// The route for operation types.
pub const TYPES: &str = "/api/types/";
/// The route for categories.
pub const CATEGORIES: &str = "/api/categories/";
/// The route for subcategories.
pub const SUBCATEGORIES: &str = "/api/subcategories/";
/// The route for notes.
pub const NOTES: &str = "/api/notes/";

/// Appended to a collection route to list its soft-deleted rows.
pub const DELETED: &str = "deleted/";
/// Appended to a collection route to address a single row.
pub const DETAIL: &str = "{id}/";
/// Appended to a collection route to restore a soft-deleted row.
pub const RESTORE: &str = "{id}/restore/";

/// The route for the income and expense totals of the filtered notes.
pub const NOTES_SUMMARY: &str = "/api/notes/summary/";
/// The route for the categories of an operation type.
pub const CATEGORIES_BY_TYPE: &str = "/api/notes/categories_by_type/";
/// The route for the subcategories of a category.
pub const SUBCATEGORIES_BY_CATEGORY: &str = "/api/notes/subcategories_by_category/";

/// Join a collection route such as [NOTES] with a suffix such as [DETAIL].
pub fn collection_route(collection: &str, suffix: &str) -> String {
    format!("{collection}{suffix}")
}

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/notes/{id}/', '{id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
