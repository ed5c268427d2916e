//! Lookups that let a note form narrow its choices to the selected parent.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    DbState, Error,
    category::{CategoryRecord, list_categories_by_type},
    query::require_id_param,
    subcategory::{SubcategoryRecord, list_subcategories_by_category},
};

/// The query parameters for [get_categories_by_type_endpoint].
#[derive(Debug, Deserialize)]
pub struct CategoriesByTypeParams {
    pub type_id: Option<String>,
}

/// The query parameters for [get_subcategories_by_category_endpoint].
#[derive(Debug, Deserialize)]
pub struct SubcategoriesByCategoryParams {
    pub category_id: Option<String>,
}

/// A route handler listing the active categories of the operation type `?type_id=`.
///
/// The response is a plain JSON array, not a page.
pub async fn get_categories_by_type_endpoint(
    State(state): State<DbState>,
    Query(params): Query<CategoriesByTypeParams>,
) -> Result<Json<Vec<CategoryRecord>>, Error> {
    let type_id = require_id_param("type_id", params.type_id.as_deref())?;
    let connection = state.lock()?;

    list_categories_by_type(type_id, &connection).map(Json)
}

/// A route handler listing the active subcategories of the category `?category_id=`.
///
/// The response is a plain JSON array, not a page.
pub async fn get_subcategories_by_category_endpoint(
    State(state): State<DbState>,
    Query(params): Query<SubcategoriesByCategoryParams>,
) -> Result<Json<Vec<SubcategoryRecord>>, Error> {
    let category_id = require_id_param("category_id", params.category_id.as_deref())?;
    let connection = state.lock()?;

    list_subcategories_by_category(category_id, &connection).map(Json)
}
