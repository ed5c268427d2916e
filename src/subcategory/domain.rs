//! Core subcategory domain types.

use serde::{Deserialize, Serialize};

use crate::{DatabaseId, timestamp::Timestamp};

/// A subcategory as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryRecord {
    pub id: DatabaseId,
    /// The ID of the parent category.
    #[serde(rename = "category")]
    pub category_id: DatabaseId,
    pub category_name: String,
    /// The name of the parent category's operation type.
    pub type_name: String,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
}

/// The request body for creating or updating a subcategory.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubcategoryInput {
    pub name: Option<String>,
    #[serde(rename = "category")]
    pub category_id: Option<DatabaseId>,
    pub description: Option<String>,
}

/// The query parameters for listing subcategories.
#[derive(Debug, Default, Deserialize)]
pub struct SubcategoryFilter {
    /// Only list subcategories of this category.
    #[serde(rename = "category")]
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// The part of a subcategory needed to check a note is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcategoryLink {
    pub id: DatabaseId,
    pub category_id: DatabaseId,
}

impl From<&SubcategoryRecord> for SubcategoryLink {
    fn from(subcategory: &SubcategoryRecord) -> Self {
        Self {
            id: subcategory.id,
            category_id: subcategory.category_id,
        }
    }
}
