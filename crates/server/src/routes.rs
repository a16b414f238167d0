//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post, put};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (unauthenticated for load balancer probes)
        .route("/v1/health", get(handlers::health_check))
        // Profiles
        .route(
            "/v1/me",
            get(handlers::get_me)
                .post(handlers::create_me)
                .patch(handlers::update_me)
                .delete(handlers::delete_me),
        )
        .route("/v1/users/{user_id}", get(handlers::get_user_profile))
        // Shelves
        .route("/v1/shelves", post(handlers::create_shelf))
        .route(
            "/v1/shelves/{shelf_id}",
            put(handlers::update_shelf).delete(handlers::delete_shelf),
        )
        .route(
            "/v1/shelves/{shelf_id}/books",
            get(handlers::get_shelf_books),
        )
        .route(
            "/v1/users/{user_id}/shelves",
            get(handlers::list_shelves),
        )
        // Library
        .route(
            "/v1/library/books/{book_id}",
            put(handlers::upsert_library_book).delete(handlers::remove_library_book),
        )
        .route(
            "/v1/library/books/{book_id}/shelves/{shelf_id}",
            put(handlers::add_book_to_shelf).delete(handlers::remove_book_from_shelf),
        )
        .route(
            "/v1/users/{user_id}/library",
            get(handlers::get_user_library_handler),
        );

    let mut router = Router::new().merge(api_routes);

    // Unauthenticated; keep it off public networks.
    if state.config.server.metrics_enabled {
        crate::metrics::register_metrics();
        router = router.route("/metrics", get(metrics_handler));
    }

    let request_timeout = state.config.server.request_timeout();

    // Layers run outermost first: trace -> timeout -> auth -> handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
