//! Checks that the classification of a note is consistent.
//!
//! A note names its type, category and subcategory separately, so nothing in
//! the schema stops them from disagreeing. These checks run over plain data
//! before anything is written.

use crate::{DatabaseId, FieldErrors, category::CategoryLink, subcategory::SubcategoryLink};

/// The error for a category that belongs to a different operation type.
pub const CATEGORY_TYPE_MISMATCH: &str =
    "Выбранная категория не принадлежит выбранному типу операции";

/// The error for a subcategory that belongs to a different category.
pub const SUBCATEGORY_CATEGORY_MISMATCH: &str =
    "Выбранная подкатегория не принадлежит выбранной категории";

/// Check that `category` belongs to the type `type_id` and that `subcategory`
/// belongs to `category`.
///
/// Each mismatch is reported against the field that would need to change.
pub fn check_classification(
    type_id: DatabaseId,
    category: CategoryLink,
    subcategory: SubcategoryLink,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if category.type_id != type_id {
        errors.add("category", CATEGORY_TYPE_MISMATCH);
    }

    if subcategory.category_id != category.id {
        errors.add("subcategory", SUBCATEGORY_CATEGORY_MISMATCH);
    }

    errors
}
