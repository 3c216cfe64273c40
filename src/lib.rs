//! Office administration backend.
//!
//! Two halves share this crate: the admin REST API over SQLite, and the client-side
//! [`sync`] core (filtered list controllers and the assignment reconciler) that talks to
//! any implementation of the [`store`] ports, including that API over HTTP.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use store::{ItemCategories, Items, Offices, Roles, Users};
use sync::AssignmentReconciler;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub reconciler: Arc<AssignmentReconciler<Repository>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self {
            reconciler: Arc::new(AssignmentReconciler::new(Arc::clone(&repo))),
            repo,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        .merge(api::resource_routes::<Offices>())
        .merge(api::resource_routes::<Roles>())
        .merge(api::resource_routes::<ItemCategories>())
        .merge(api::resource_routes::<Items>())
        .merge(api::resource_routes::<Users>())
        .route("/users/grouped", get(api::list_grouped_users))
        .route(
            "/users/{id}/assignments",
            get(api::list_user_assignments)
                .put(api::replace_user_assignments)
                .delete(api::delete_user_assignments),
        )
        .route("/assignments", post(api::create_assignment))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
