//! Categories are the first level of the classification under an operation type.

mod db;
mod domain;

pub use db::{
    Category, create_category_table, find_category, get_category_link, insert_category,
    list_categories_by_type,
};
pub use domain::{CategoryFilter, CategoryInput, CategoryLink, CategoryRecord};
