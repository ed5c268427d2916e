//! Subcategories are the second level of the classification, under a category.

mod db;
mod domain;

pub use db::{
    Subcategory, create_subcategory_table, find_subcategory, get_subcategory_link,
    insert_subcategory, list_subcategories_by_category,
};
pub use domain::{SubcategoryFilter, SubcategoryInput, SubcategoryLink, SubcategoryRecord};
