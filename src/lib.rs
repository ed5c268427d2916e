//! DDS is a small web service for tracking cash flow (ДДС, движение денежных средств).
//!
//! This library provides a JSON REST API over a SQLite database with:
//! - reference data: statuses, operation types, categories and subcategories,
//! - notes, the individual money movements,
//! - soft-delete and restore for every entity,
//! - filtering, search, ordering and pagination for every collection,
//! - an income/expense summary over any filtered set of notes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod category;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod named;
mod note;
mod pagination;
mod query;
mod resource;
mod routing;
mod seed;
mod soft_delete;
mod status;
mod subcategory;
mod timestamp;
mod transaction_type;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DbState};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use seed::{SeedReport, load_initial_data};
pub use validation::FieldErrors;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body failed validation.
    ///
    /// The errors are keyed by the name of the offending field, or by
    /// `non_field_errors` for errors that concern the object as a whole.
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    /// A query parameter that an action cannot work without was not given.
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    /// The request body is not valid JSON or does not have the expected shape.
    #[error("{0}")]
    InvalidBody(String),

    /// A query parameter could not be parsed.
    #[error("\"{value}\" is not a valid value for the {name} parameter")]
    InvalidParameter {
        /// The name of the query parameter.
        name: &'static str,
        /// The raw value the client sent.
        value: String,
    },

    /// The requested page is out of range or is not a positive integer.
    #[error("Invalid page.")]
    InvalidPage,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the ID is
    /// correct and that the resource has not been soft-deleted.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Not found.")]
    NotFound,

    /// Tried to permanently delete a row that a note still refers to.
    ///
    /// The API only ever soft-deletes, so this error is raised by
    /// administrative code working on the database directly.
    #[error("the row is referenced by a note and cannot be deleted")]
    ProtectedReference,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, message)
                if is_foreign_key_violation(sql_error.extended_code, message.as_deref()) =>
            {
                Error::ProtectedReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// SQLite reports a violated `ON DELETE RESTRICT` as a trigger constraint
/// rather than a foreign key one.
fn is_foreign_key_violation(extended_code: std::ffi::c_int, message: Option<&str>) -> bool {
    match extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => true,
        rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER => {
            message.is_some_and(|message| message.contains("FOREIGN KEY constraint failed"))
        }
        _ => false,
    }
}

impl From<JsonRejection> for Error {
    fn from(value: JsonRejection) -> Self {
        Error::InvalidBody(value.body_text())
    }
}

/// An ID in the path that is not an integer cannot match any row.
impl From<PathRejection> for Error {
    fn from(value: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", value.body_text());
        Error::NotFound
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Error::InvalidBody(_) | Error::MissingParameter(_) | Error::InvalidParameter { .. } => {
                error_body(StatusCode::BAD_REQUEST, &self.to_string())
            }
            Error::NotFound | Error::InvalidPage => {
                error_body(StatusCode::NOT_FOUND, &self.to_string())
            }
            Error::ProtectedReference => error_body(StatusCode::CONFLICT, &self.to_string()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
