use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    process::exit,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dds_rs::{
    AppState, PaginationConfig, build_router, graceful_shutdown, load_initial_data,
    logging_middleware,
};

/// The REST API server for the DDS cash-flow ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// The address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// The number of items per page when a request does not ask for a page size.
    #[arg(long, default_value_t = 20)]
    page_size: u64,

    /// The largest page size a request may ask for.
    #[arg(long, default_value_t = 100)]
    max_page_size: u64,

    /// Load the initial statuses, types, categories and subcategories before serving.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if args.page_size == 0 || args.page_size > args.max_page_size {
        tracing::error!(
            "The page size must be between 1 and the max page size ({}), got {}.",
            args.max_page_size,
            args.page_size
        );
        exit(1);
    }

    let addr = SocketAddr::new(args.host, args.port);

    let conn = Connection::open(&args.db_path).unwrap_or_else(|error| {
        tracing::error!("Could not open the database at {:?}: {error}", args.db_path);
        exit(1);
    });

    let pagination_config = PaginationConfig {
        default_page_size: args.page_size,
        max_page_size: args.max_page_size,
    };

    let app_state = AppState::new(conn, pagination_config).unwrap_or_else(|error| {
        tracing::error!("Could not initialize the database: {error}");
        exit(1);
    });

    if args.seed {
        let result = match app_state.db_connection.lock() {
            Ok(conn) => load_initial_data(&conn),
            Err(_) => Err(dds_rs::Error::DatabaseLockError),
        };

        if let Err(error) = result {
            tracing::error!("Could not load the initial data: {error}");
            exit(1);
        }
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(app_state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged when they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
