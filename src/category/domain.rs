//! Core category domain types.

use serde::{Deserialize, Serialize};

use crate::{DatabaseId, timestamp::Timestamp};

/// A category as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: DatabaseId,
    pub name: String,
    /// The ID of the operation type the category belongs to.
    #[serde(rename = "type")]
    pub type_id: DatabaseId,
    pub type_name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
}

/// The request body for creating or updating a category.
///
/// Output-only fields such as `type_name` are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<DatabaseId>,
    pub description: Option<String>,
}

/// The query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    /// Only list categories of this operation type.
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// The part of a category needed to check a note is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLink {
    pub id: DatabaseId,
    pub type_id: DatabaseId,
}

impl From<&CategoryRecord> for CategoryLink {
    fn from(category: &CategoryRecord) -> Self {
        Self {
            id: category.id,
            type_id: category.type_id,
        }
    }
}
