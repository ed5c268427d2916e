//! The operations every collection in the API supports, and generic route handlers for them.
//!
//! Each collection (statuses, types, categories, subcategories, notes)
//! implements [Resource], and the router mounts the same set of handlers for
//! each one:
//!
//! | Verb   | Path                    | Handler                    |
//! |--------|-------------------------|----------------------------|
//! | GET    | `/api/<name>/`          | [list_endpoint]            |
//! | POST   | `/api/<name>/`          | [create_endpoint]          |
//! | GET    | `/api/<name>/deleted/`  | [list_deleted_endpoint]    |
//! | GET    | `/api/<name>/{id}/`     | [retrieve_endpoint]        |
//! | PUT    | `/api/<name>/{id}/`     | [update_endpoint]          |
//! | PATCH  | `/api/<name>/{id}/`     | [partial_update_endpoint]  |
//! | DELETE | `/api/<name>/{id}/`     | [delete_endpoint]          |
//! | POST   | `/api/<name>/{id}/restore/` | [restore_endpoint]     |

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AppState, DatabaseId, DbState, Error,
    app_state::lock_connection,
    pagination::{Page, PageParams, PageRequest},
    soft_delete::{Scope, SoftDelete},
    validation::WriteMode,
};

/// A collection of soft-deletable records exposed over the API.
pub trait Resource: SoftDelete + Send + Sync + 'static {
    /// The shape returned to clients.
    type Record: Serialize + Send + 'static;
    /// The shape accepted by create and update.
    type Input: DeserializeOwned + Send + 'static;
    /// The filter, search and ordering query parameters of a listing.
    type Filter: DeserializeOwned + Send + 'static;

    /// One page of the rows in `scope` that match `filter`.
    fn list(
        filter: &Self::Filter,
        scope: Scope,
        request: PageRequest,
        connection: &Connection,
    ) -> Result<Page<Self::Record>, Error>;

    /// The active row `id`.
    fn retrieve(id: DatabaseId, connection: &Connection) -> Result<Self::Record, Error>;

    /// Validate `input` and insert a new row.
    fn create(input: Self::Input, connection: &Connection) -> Result<Self::Record, Error>;

    /// Validate `input` and update the active row `id`.
    fn update(
        id: DatabaseId,
        input: Self::Input,
        mode: WriteMode,
        connection: &Connection,
    ) -> Result<Self::Record, Error>;
}

/// List the active rows of a collection.
pub async fn list_endpoint<R: Resource>(
    State(state): State<AppState>,
    Query(filter): Query<R::Filter>,
    Query(page_params): Query<PageParams>,
) -> Result<Json<Page<R::Record>>, Error> {
    list_scope::<R>(&state, &filter, &page_params, Scope::Active).map(Json)
}

/// List the soft-deleted rows of a collection, with the same parameters as [list_endpoint].
pub async fn list_deleted_endpoint<R: Resource>(
    State(state): State<AppState>,
    Query(filter): Query<R::Filter>,
    Query(page_params): Query<PageParams>,
) -> Result<Json<Page<R::Record>>, Error> {
    list_scope::<R>(&state, &filter, &page_params, Scope::Deleted).map(Json)
}

fn list_scope<R: Resource>(
    state: &AppState,
    filter: &R::Filter,
    page_params: &PageParams,
    scope: Scope,
) -> Result<Page<R::Record>, Error> {
    let request = PageRequest::from_params(page_params, &state.pagination_config)?;
    let connection = lock_connection(&state.db_connection)?;

    R::list(filter, scope, request, &connection)
}

/// Get a single active row.
pub async fn retrieve_endpoint<R: Resource>(
    State(state): State<DbState>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<Json<R::Record>, Error> {
    let Path(id) = path?;
    let connection = state.lock()?;

    R::retrieve(id, &connection).map(Json)
}

/// Create a row, responding with 201 and the new row.
pub async fn create_endpoint<R: Resource>(
    State(state): State<DbState>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<R::Record>), Error> {
    let Json(input) = payload?;
    let connection = state.lock()?;

    let record = R::create(input, &connection)?;
    tracing::debug!("Created {}", R::LABEL);

    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace the writable fields of an active row.
pub async fn update_endpoint<R: Resource>(
    State(state): State<DbState>,
    path: Result<Path<DatabaseId>, PathRejection>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R::Record>, Error> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let connection = state.lock()?;

    R::update(id, input, WriteMode::Full, &connection).map(Json)
}

/// Change only the given fields of an active row.
pub async fn partial_update_endpoint<R: Resource>(
    State(state): State<DbState>,
    path: Result<Path<DatabaseId>, PathRejection>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R::Record>, Error> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let connection = state.lock()?;

    R::update(id, input, WriteMode::Partial, &connection).map(Json)
}

/// Soft-delete an active row, responding with 204 No Content.
pub async fn delete_endpoint<R: Resource>(
    State(state): State<DbState>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(id) = path?;
    let connection = state.lock()?;

    R::soft_delete(id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted row, responding with 200 and no body.
pub async fn restore_endpoint<R: Resource>(
    State(state): State<DbState>,
    path: Result<Path<DatabaseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(id) = path?;
    let connection = state.lock()?;

    R::restore(id, &connection)?;

    Ok(StatusCode::OK)
}
