use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use dds_rs::{initialize_db, load_initial_data};

/// A utility for loading the initial statuses, operation types, categories and
/// subcategories into a DDS database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,
}

/// Create any missing reference data. Existing rows, including soft-deleted
/// ones, are left alone.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let db_path = Path::new(&args.db_path);

    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Database path must include a file extension (e.g., 'dds.db').");
            exit(1);
        }
    }

    println!("Loading initial data into {db_path:#?}");
    let conn = Connection::open(db_path)?;

    initialize_db(&conn)?;
    let report = load_initial_data(&conn)?;

    println!("Success! {report}.");

    Ok(())
}
