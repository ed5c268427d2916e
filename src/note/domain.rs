//! Core note domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DatabaseId, timestamp::Timestamp};

/// A note, a single money movement, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: DatabaseId,
    /// When the money moved.
    pub created_date: Timestamp,
    #[serde(rename = "status")]
    pub status_id: DatabaseId,
    #[serde(rename = "type")]
    pub type_id: DatabaseId,
    #[serde(rename = "category")]
    pub category_id: DatabaseId,
    #[serde(rename = "subcategory")]
    pub subcategory_id: DatabaseId,
    /// The amount in roubles with two decimal places, serialized as a string.
    pub amount: Decimal,
    pub comment: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
    pub status_name: String,
    pub type_name: String,
    pub category_name: String,
    pub subcategory_name: String,
    /// The amount formatted for display, e.g. "1 234 567,50".
    pub formatted_amount: String,
    /// `created_date` formatted for display, e.g. "01.03.2025 10:30".
    pub formatted_date: String,
}

/// The request body for creating or updating a note.
///
/// Only the core fields are accepted. Audit fields, parent names and the
/// formatted fields are output-only and are ignored if sent.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoteInput {
    /// Defaults to the current time on create.
    pub created_date: Option<String>,
    #[serde(rename = "status")]
    pub status_id: Option<DatabaseId>,
    #[serde(rename = "type")]
    pub type_id: Option<DatabaseId>,
    #[serde(rename = "category")]
    pub category_id: Option<DatabaseId>,
    #[serde(rename = "subcategory")]
    pub subcategory_id: Option<DatabaseId>,
    /// A JSON number or a decimal string.
    pub amount: Option<Value>,
    pub comment: Option<String>,
}

/// A validated note ready to be written to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub created_date: Timestamp,
    pub status_id: DatabaseId,
    pub type_id: DatabaseId,
    pub category_id: DatabaseId,
    pub subcategory_id: DatabaseId,
    pub amount: Decimal,
    pub comment: String,
}

/// The query parameters for listing and summarising notes.
#[derive(Debug, Default, Deserialize)]
pub struct NoteFilter {
    #[serde(rename = "status")]
    pub status_id: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    #[serde(rename = "category")]
    pub category_id: Option<String>,
    #[serde(rename = "subcategory")]
    pub subcategory_id: Option<String>,
    /// Inclusive lower bound on the date part of `created_date`, as `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound on the date part of `created_date`, as `YYYY-MM-DD`.
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}
