// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::users;
use crate::middleware::require_session;
use crate::AppState;

/// Create the service router.
///
/// Only `/register` and `/login` are reachable without a session token.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", get(users::list))
        .route("/users/{id}", put(users::update))
        .route("/users/{id}/password", put(users::change_password))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
