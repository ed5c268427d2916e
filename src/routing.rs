//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState, Error,
    category::Category,
    endpoints::{self, collection_route},
    note::{
        Note, get_categories_by_type_endpoint, get_subcategories_by_category_endpoint,
        get_summary_endpoint,
    },
    resource::{
        Resource, create_endpoint, delete_endpoint, list_deleted_endpoint, list_endpoint,
        partial_update_endpoint, restore_endpoint, retrieve_endpoint, update_endpoint,
    },
    status::Status,
    subcategory::Subcategory,
    transaction_type::TransactionType,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let note_routes = Router::new()
        .route(endpoints::NOTES_SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::CATEGORIES_BY_TYPE,
            get(get_categories_by_type_endpoint),
        )
        .route(
            endpoints::SUBCATEGORIES_BY_CATEGORY,
            get(get_subcategories_by_category_endpoint),
        );

    Router::new()
        .merge(resource_routes::<Status>(endpoints::STATUSES))
        .merge(resource_routes::<TransactionType>(endpoints::TYPES))
        .merge(resource_routes::<Category>(endpoints::CATEGORIES))
        .merge(resource_routes::<Subcategory>(endpoints::SUBCATEGORIES))
        .merge(resource_routes::<Note>(endpoints::NOTES))
        .merge(note_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The list, detail, `deleted/` and `restore/` routes for one collection.
///
/// Static segments such as `deleted/` take priority over `{id}`, so the
/// collection's extra actions never reach the detail handlers.
fn resource_routes<R: Resource>(collection: &str) -> Router<AppState> {
    Router::new()
        .route(
            collection,
            get(list_endpoint::<R>).post(create_endpoint::<R>),
        )
        .route(
            &collection_route(collection, endpoints::DELETED),
            get(list_deleted_endpoint::<R>),
        )
        .route(
            &collection_route(collection, endpoints::DETAIL),
            get(retrieve_endpoint::<R>)
                .put(update_endpoint::<R>)
                .patch(partial_update_endpoint::<R>)
                .delete(delete_endpoint::<R>),
        )
        .route(
            &collection_route(collection, endpoints::RESTORE),
            post(restore_endpoint::<R>),
        )
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
