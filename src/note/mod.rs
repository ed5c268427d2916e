//! Notes are the individual money movements: an amount on a date, classified
//! by status, operation type, category and subcategory.

mod amount;
mod consistency;
mod db;
mod domain;
mod lookup;
mod summary;

pub use db::{Note, create_note_table};
#[cfg(test)]
pub use db::insert_note;
pub use domain::{NewNote, NoteFilter, NoteInput, NoteRecord};
pub use lookup::{get_categories_by_type_endpoint, get_subcategories_by_category_endpoint};
pub use summary::get_summary_endpoint;
