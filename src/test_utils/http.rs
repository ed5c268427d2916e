use axum_test::TestServer;
use rusqlite::Connection;

use crate::{AppState, PaginationConfig, build_router};

/// A test server over an empty in-memory database.
#[track_caller]
pub(crate) fn get_test_server() -> TestServer {
    get_test_server_with_state().0
}

/// A test server and the state it was built from, for arranging data directly.
#[track_caller]
pub(crate) fn get_test_server_with_state() -> (TestServer, AppState) {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    let state = AppState::new(connection, PaginationConfig::default())
        .expect("Could not create app state");

    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}
